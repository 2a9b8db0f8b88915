use anyhow::{anyhow, Context, Result};
use clap::Parser;
use detectify_upload::cli::{Args, Mode};
use detectify_upload::{CandidateFile, Phase, TerminalSurface, UploadSession, UploadTransport};
use serde_json::json;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    setup_tracing();
    let args = Args::parse();

    let config = args.client_config()?;
    let transport = UploadTransport::new(&config)?;

    if args.mode == Mode::Ping {
        let body = transport.ping().await?;
        println!("{}", body.trim());
        return Ok(ExitCode::SUCCESS);
    }

    let path = args
        .file
        .as_ref()
        .ok_or_else(|| anyhow!("FILE argument required for upload mode"))?;
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }
    let file = CandidateFile::from_path(path)
        .with_context(|| format!("Failed to prepare {}", path.display()))?;

    let surface = TerminalSurface::new(!args.json)?;
    let mut session = UploadSession::new(transport, config.max_bytes, surface);

    if let Err(err) = session.on_file_chosen(file) {
        if args.json {
            println!("{}", json!({ "success": false, "error": err.to_string() }));
        }
        return Ok(ExitCode::FAILURE);
    }

    let code = match session.settle().await {
        Some(Phase::Succeeded(classification)) => {
            if args.json {
                println!(
                    "{}",
                    json!({
                        "success": true,
                        "label": classification.label,
                        "confidence": classification.confidence,
                    })
                );
            }
            ExitCode::SUCCESS
        }
        Some(Phase::Failed(err)) => {
            if args.json {
                println!("{}", json!({ "success": false, "error": err.to_string() }));
            }
            ExitCode::FAILURE
        }
        _ => ExitCode::FAILURE,
    };

    Ok(code)
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

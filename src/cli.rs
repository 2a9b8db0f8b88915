use crate::config::{ClientConfig, DEFAULT_MAX_BYTES, DEFAULT_SERVER};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Upload,
    Ping,
}

#[derive(Parser, Debug)]
#[command(name = "detectify")]
#[command(author, version, about = "Upload a video or image for deepfake classification", long_about = None)]
pub struct Args {
    /// File to classify (required in upload mode)
    pub file: Option<PathBuf>,

    /// Classification server base URL
    #[arg(short, long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// What to do
    #[arg(short, long, value_enum, default_value = "upload")]
    pub mode: Mode,

    /// Largest file accepted for upload, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    pub max_bytes: u64,

    /// HTTP proxy (e.g., http://127.0.0.1:7890)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Request timeout in seconds (default: none)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the outcome as JSON on stdout instead of the result banner
    #[arg(long)]
    pub json: bool,
}

impl Args {
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.server)?;
        config.max_bytes = self.max_bytes;
        config.proxy = self.proxy.clone();
        config.timeout = self.timeout.map(Duration::from_secs);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["detectify", "clip.mp4"]).unwrap();
        assert_eq!(args.mode, Mode::Upload);
        assert_eq!(args.file, Some(PathBuf::from("clip.mp4")));

        let config = args.client_config().unwrap();
        assert_eq!(config.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.upload_url().unwrap().as_str(), "http://127.0.0.1:5000/upload");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn ping_needs_no_file() {
        let args = Args::try_parse_from(["detectify", "--mode", "ping"]).unwrap();
        assert_eq!(args.mode, Mode::Ping);
        assert!(args.file.is_none());
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "detectify",
            "a.png",
            "--server",
            "http://10.0.0.2:8080",
            "--max-bytes",
            "1024",
            "--timeout",
            "30",
            "--json",
        ])
        .unwrap();
        let config = args.client_config().unwrap();
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.server.as_str(), "http://10.0.0.2:8080/");
        assert!(args.json);
    }
}

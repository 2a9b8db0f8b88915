use crate::config::ClientConfig;
use crate::error::UploadError;
use crate::models::{AttemptId, CandidateFile, FileSource, ServerOutcome};
use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Url};
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task;
use tokio_util::io::ReaderStream;
use tracing::{debug, trace, warn};

/// Read size for streaming the request body. Each chunk handed to the HTTP
/// stack produces at most one progress tick.
const CHUNK_SIZE: usize = 64 * 1024;

/// Multipart field the server reads the upload from.
const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub enum TransportEvent {
    /// Fraction of the request body sent so far, in `[0, 1]`.
    Progress(f64),
    /// Terminal notification; nothing follows it for the same attempt.
    Finished(Result<ServerOutcome, UploadError>),
}

pub type EventSender = UnboundedSender<(AttemptId, TransportEvent)>;

type ChunkStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

#[derive(Clone)]
pub struct UploadTransport {
    client: Client,
    upload_url: Url,
    ping_url: Url,
}

impl UploadTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(proxy_url) = &config.proxy {
            client_builder = client_builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .with_context(|| format!("Invalid proxy URL: {proxy_url}"))?,
            );
        }

        let client = client_builder
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            upload_url: config.upload_url()?,
            ping_url: config.ping_url()?,
        })
    }

    /// Starts the upload on a background task and returns immediately.
    /// Progress and the terminal result arrive on `events`, tagged with `id`.
    pub fn submit(&self, id: AttemptId, file: CandidateFile, events: EventSender) {
        let client = self.client.clone();
        let url = self.upload_url.clone();

        task::spawn(async move {
            let reporter = Arc::new(ProgressReporter::new(id, file.len(), events));
            let result = send_upload(&client, url, file, Arc::clone(&reporter)).await;
            reporter.finish(result);
        });
    }

    /// Checks that the classification server is reachable.
    pub async fn ping(&self) -> Result<String> {
        let response = self
            .client
            .get(self.ping_url.clone())
            .send()
            .await
            .context("Ping request failed")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read ping response")?;
        if !status.is_success() {
            return Err(anyhow!("Ping failed: {} {}", status, body.trim()));
        }
        Ok(body)
    }
}

async fn send_upload(
    client: &Client,
    url: Url,
    file: CandidateFile,
    reporter: Arc<ProgressReporter>,
) -> Result<ServerOutcome, UploadError> {
    let total = file.len();
    let name = file.name().map(str::to_string);
    let mime = file.mime().map(str::to_string);

    let chunks = open_chunks(file.source(), total).await?;
    let counted = chunks.map(move |chunk| {
        if let Ok(bytes) = &chunk {
            reporter.advance(bytes.len());
        }
        chunk
    });

    let mut part = Part::stream_with_length(Body::wrap_stream(counted), total);
    if let Some(name) = name {
        part = part.file_name(name);
    }
    if let Some(mime) = mime {
        part = part.mime_str(&mime)?;
    }
    let form = Form::new().part(FILE_FIELD, part);

    debug!(%url, total, "posting upload");
    let response = client.post(url).multipart(form).send().await?;
    let status = response.status();
    let body = response.bytes().await?;
    debug!(%status, len = body.len(), "upload response received");

    Ok(ServerOutcome::parse(&body))
}

/// Opens the body stream, refusing sources whose size disagrees with the
/// length the multipart part will declare.
async fn open_chunks(source: &FileSource, declared: u64) -> Result<ChunkStream, UploadError> {
    match source {
        FileSource::Path(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(UploadError::network)?;
            let actual = file.metadata().await.map_err(UploadError::network)?.len();
            check_len(declared, actual)?;
            Ok(Box::pin(ReaderStream::with_capacity(
                file.take(declared),
                CHUNK_SIZE,
            )))
        }
        FileSource::Memory(data) => {
            check_len(declared, data.len() as u64)?;
            let data = data.clone();
            let chunks: Vec<io::Result<Bytes>> = (0..data.len())
                .step_by(CHUNK_SIZE)
                .map(|start| Ok(data.slice(start..data.len().min(start + CHUNK_SIZE))))
                .collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }
}

fn check_len(declared: u64, actual: u64) -> Result<(), UploadError> {
    if declared != actual {
        return Err(UploadError::network(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("declared length {declared} does not match {actual} bytes available"),
        )));
    }
    Ok(())
}

/// Counts body bytes as they leave and forwards progress to the attempt's
/// channel. The `closed` flag is checked and set under the same lock as the
/// sends, so no progress can land behind the terminal event.
struct ProgressReporter {
    id: AttemptId,
    total: u64,
    inner: Mutex<ReporterState>,
    events: EventSender,
}

struct ReporterState {
    sent: u64,
    closed: bool,
}

impl ProgressReporter {
    fn new(id: AttemptId, total: u64, events: EventSender) -> Self {
        Self {
            id,
            total,
            inner: Mutex::new(ReporterState {
                sent: 0,
                closed: false,
            }),
            events,
        }
    }

    fn advance(&self, n: usize) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if state.closed {
            return;
        }
        state.sent += n as u64;
        if self.total == 0 {
            return;
        }

        let fraction = (state.sent as f64 / self.total as f64).min(1.0);
        trace!(attempt = %self.id, sent = state.sent, fraction, "upload progress");
        let _ = self.events.send((self.id, TransportEvent::Progress(fraction)));
    }

    fn finish(&self, result: Result<ServerOutcome, UploadError>) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.closed = true;

        if let Err(err) = &result {
            warn!(attempt = %self.id, error = %err, "upload failed");
        }
        if self
            .events
            .send((self.id, TransportEvent::Finished(result)))
            .is_err()
        {
            debug!(attempt = %self.id, "session gone before upload finished");
        }
    }
}

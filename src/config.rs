use anyhow::{Context, Result};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Largest file accepted for upload (500 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 500 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: Url,
    pub max_bytes: u64,
    pub proxy: Option<String>,
    /// `None` leaves timing to the HTTP stack.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(server: &str) -> Result<Self> {
        let server = Url::parse(server).with_context(|| format!("Invalid server URL: {server}"))?;
        Ok(Self {
            server,
            max_bytes: DEFAULT_MAX_BYTES,
            proxy: None,
            timeout: None,
        })
    }

    pub fn upload_url(&self) -> Result<Url> {
        self.endpoint("upload")
    }

    pub fn ping_url(&self) -> Result<Url> {
        self.endpoint("ping")
    }

    // Url::join drops the last segment unless the base ends in '/'.
    fn endpoint(&self, name: &str) -> Result<Url> {
        let mut base = self.server.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(name)
            .with_context(|| format!("Failed to build {name} URL from {}", self.server))
    }
}

use thiserror::Error;

/// Message used when the server gives no usable error text.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Everything that can end an upload without a classification.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Rejected at intake; never reaches the network.
    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    /// The request could not complete (connect, send or body read failed).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A response arrived but was unparseable or reported `success: false`.
    #[error("{message}")]
    Protocol { message: String },
}

impl UploadError {
    pub fn network(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Network(err.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(Box::new(err))
    }
}

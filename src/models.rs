use crate::error::UNKNOWN_ERROR;
use anyhow::{Context, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Identifies one submit-to-outcome cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Bytes),
}

/// A file picked or dropped by the user, pending upload.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    name: Option<String>,
    mime: Option<String>,
    len: u64,
    source: FileSource,
}

impl CandidateFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("Not a regular file: {}", path.display());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        Ok(Self {
            mime: guess_mime(path).map(str::to_string),
            name,
            len: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let data = data.into();
        Self {
            mime: guess_mime(Path::new(&name)).map(str::to_string),
            name: Some(name),
            len: data.len() as u64,
            source: FileSource::Memory(data),
        }
    }

    /// Overrides the declared size. Hosts that learn the size from the
    /// platform (rather than from the bytes) report it here; an upload whose
    /// bytes do not match the declared size fails before anything is sent.
    pub fn with_declared_len(mut self, len: u64) -> Self {
        self.len = len;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }
}

/// Media types the classification server accepts, keyed by extension.
fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => return None,
    };
    Some(mime)
}

/// JavaScript truthiness, which is how the upload page reads these fields.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    Real,
    Deepfake,
    Other(String),
}

impl Label {
    pub fn is_real(&self) -> bool {
        matches!(self, Label::Real)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Real => "REAL",
            Label::Deepfake => "DEEPFAKE",
            Label::Other(raw) => raw,
        }
    }
}

impl From<String> for Label {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "REAL" => Label::Real,
            "DEEPFAKE" => Label::Deepfake,
            _ => Label::Other(raw),
        }
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Label,
    /// Percentage in `0..=100`, as reported by the server.
    pub confidence: f64,
}

/// Parsed body of a completed `/upload` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerOutcome {
    Success { label: Label, confidence: f64 },
    Failure { message: String },
}

/// Fields are read loosely: servers send `success: 1`, numeric error codes
/// and the like, and those still count the way a browser client reads them.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    label: Value,
    #[serde(default)]
    confidence: Value,
    #[serde(default)]
    error: Value,
}

impl ServerOutcome {
    /// Interprets a response body. Never fails: anything that does not match
    /// the expected schema becomes a `Failure`.
    pub fn parse(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return Self::unknown();
        };
        if !value.is_object() {
            return Self::unknown();
        }
        let Ok(resp) = serde_json::from_value::<UploadResponse>(value) else {
            return Self::unknown();
        };

        if !is_truthy(&resp.success) {
            if !is_truthy(&resp.error) {
                return Self::unknown();
            }
            let message = match resp.error {
                Value::String(text) => text,
                other => other.to_string(),
            };
            return ServerOutcome::Failure { message };
        }

        match (resp.label, resp.confidence.as_f64()) {
            (Value::String(label), Some(confidence)) => ServerOutcome::Success {
                label: Label::from(label),
                confidence,
            },
            _ => Self::unknown(),
        }
    }

    fn unknown() -> Self {
        ServerOutcome::Failure {
            message: UNKNOWN_ERROR.to_string(),
        }
    }
}

use crate::error::UploadError;
use crate::models::{AttemptId, CandidateFile, Classification, ServerOutcome};
use tracing::{debug, trace};

#[derive(Debug)]
pub enum Phase {
    Idle,
    /// `fraction` stays `None` until the transport reports a computable total.
    Uploading { fraction: Option<f64> },
    Succeeded(Classification),
    Failed(UploadError),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded(_) | Phase::Failed(_))
    }
}

/// Phase tracking for a single file. Terminal phases absorb every later event.
#[derive(Debug)]
pub struct UploadAttempt {
    id: AttemptId,
    file_name: Option<String>,
    total_bytes: u64,
    phase: Phase,
}

impl UploadAttempt {
    pub fn new(id: AttemptId, file: &CandidateFile) -> Self {
        Self {
            id,
            file_name: file.name().map(str::to_string),
            total_bytes: file.len(),
            phase: Phase::Idle,
        }
    }

    pub fn id(&self) -> AttemptId {
        self.id
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn begin(&mut self) -> bool {
        if !matches!(self.phase, Phase::Idle) {
            return false;
        }
        self.phase = Phase::Uploading { fraction: None };
        true
    }

    /// Applies a progress tick. Returns `false` when the tick would move the
    /// fraction backwards or arrives outside `Uploading`.
    pub fn record_progress(&mut self, fraction: f64) -> bool {
        let Phase::Uploading { fraction: current } = &mut self.phase else {
            trace!(attempt = %self.id, fraction, "progress outside uploading phase");
            return false;
        };
        if fraction.is_nan() {
            return false;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if current.is_some_and(|last| fraction < last) {
            return false;
        }
        *current = Some(fraction);
        true
    }

    /// Resolves the attempt from the transport's terminal result.
    pub fn finish(&mut self, result: Result<ServerOutcome, UploadError>) -> bool {
        if !matches!(self.phase, Phase::Uploading { .. }) {
            debug!(attempt = %self.id, "ignoring completion for attempt not uploading");
            return false;
        }

        self.phase = match result {
            Ok(ServerOutcome::Success { label, confidence }) => {
                Phase::Succeeded(Classification { label, confidence })
            }
            Ok(ServerOutcome::Failure { message }) => Phase::Failed(UploadError::protocol(message)),
            Err(err) => Phase::Failed(err),
        };
        true
    }
}

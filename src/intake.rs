//! Turns the two ways a user can hand over a file (choosing it, dropping it)
//! into one validated candidate.

use crate::error::UploadError;
use crate::models::CandidateFile;

/// Pointer events over the drop zone.
#[derive(Debug, Clone)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    /// Carries the first dropped file, if the drop had one.
    Drop(Option<CandidateFile>),
}

/// Pure size check applied before any network call.
pub fn validate_size(size: u64, limit: u64) -> Result<(), UploadError> {
    if size > limit {
        return Err(UploadError::FileTooLarge { size, limit });
    }
    Ok(())
}

#[derive(Debug)]
pub struct IntakeController {
    max_bytes: u64,
    drag_active: bool,
}

impl IntakeController {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            drag_active: false,
        }
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn on_file_chosen(&self, file: CandidateFile) -> Result<CandidateFile, UploadError> {
        self.accept(file)
    }

    pub fn on_file_dropped(&self, file: CandidateFile) -> Result<CandidateFile, UploadError> {
        self.accept(file)
    }

    /// Updates the drag indicator and, on a drop carrying a file, validates it.
    pub fn on_drag(&mut self, event: DragEvent) -> Option<Result<CandidateFile, UploadError>> {
        match event {
            DragEvent::Enter | DragEvent::Over => {
                self.drag_active = true;
                None
            }
            DragEvent::Leave => {
                self.drag_active = false;
                None
            }
            DragEvent::Drop(file) => {
                self.drag_active = false;
                file.map(|f| self.on_file_dropped(f))
            }
        }
    }

    fn accept(&self, file: CandidateFile) -> Result<CandidateFile, UploadError> {
        validate_size(file.len(), self.max_bytes)?;
        Ok(file)
    }
}

//! Maps attempt phases to what the user sees. Everything here is a pure
//! function of its input; no rendering state carries over between calls.

use crate::error::UploadError;
use crate::models::{Classification, Label};
use crate::state::Phase;
use crate::surface::Surface;
use std::fmt;

pub const STATUS_UPLOADING: &str = "Uploading...";
pub const STATUS_DONE: &str = "Done.";
pub const STATUS_TOO_LARGE: &str = "File too large.";
pub const STATUS_UPLOAD_FAILED: &str = "Upload failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub verdict: Verdict,
    pub label: Label,
    pub confidence: f64,
}

impl From<&Classification> for Banner {
    fn from(c: &Classification) -> Self {
        let verdict = if c.label.is_real() {
            Verdict::Positive
        } else {
            Verdict::Negative
        };
        Self {
            verdict,
            label: c.label.clone(),
            confidence: c.confidence,
        }
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Anything not REAL reads as a deepfake; the raw label stays on `label`.
        let text = match self.verdict {
            Verdict::Positive => "🟢 REAL",
            Verdict::Negative => "🔴 DEEPFAKE",
        };
        write!(f, "{} — {}%", text, self.confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressView {
    Visible { percent: f64 },
    /// Hidden with the fill reset to 0%.
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum BannerUpdate {
    #[default]
    Keep,
    Clear,
    Show(Banner),
}

/// Changes to push into a [`Surface`]. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct View {
    pub status: Option<String>,
    pub progress: Option<ProgressView>,
    pub banner: BannerUpdate,
}

impl View {
    pub fn apply<S: Surface + ?Sized>(&self, surface: &mut S) {
        match self.progress {
            Some(ProgressView::Visible { percent }) => surface.show_progress(percent),
            Some(ProgressView::Hidden) => surface.hide_progress(),
            None => {}
        }
        match &self.banner {
            BannerUpdate::Keep => {}
            BannerUpdate::Clear => surface.clear_banner(),
            BannerUpdate::Show(banner) => surface.show_banner(banner),
        }
        if let Some(status) = &self.status {
            surface.set_status(status);
        }
    }
}

pub fn render(phase: &Phase) -> View {
    match phase {
        Phase::Idle => View::default(),
        Phase::Uploading { fraction } => View {
            status: Some(STATUS_UPLOADING.to_string()),
            progress: Some(ProgressView::Visible {
                percent: fraction.unwrap_or(0.0) * 100.0,
            }),
            banner: BannerUpdate::Clear,
        },
        Phase::Succeeded(classification) => View {
            status: Some(STATUS_DONE.to_string()),
            progress: Some(ProgressView::Hidden),
            banner: BannerUpdate::Show(Banner::from(classification)),
        },
        Phase::Failed(err) => View {
            status: Some(failure_status(err)),
            progress: Some(ProgressView::Hidden),
            banner: BannerUpdate::Keep,
        },
    }
}

/// View for a progress tick within `Uploading`: only the fill moves.
pub fn render_progress(fraction: f64) -> View {
    View {
        progress: Some(ProgressView::Visible {
            percent: fraction.clamp(0.0, 1.0) * 100.0,
        }),
        ..View::default()
    }
}

/// View for a file turned away at intake. No attempt exists, so only the
/// status line changes.
pub fn render_rejection(err: &UploadError) -> View {
    View {
        status: Some(failure_status(err)),
        ..View::default()
    }
}

fn failure_status(err: &UploadError) -> String {
    match err {
        UploadError::FileTooLarge { .. } => STATUS_TOO_LARGE.to_string(),
        UploadError::Network(_) => STATUS_UPLOAD_FAILED.to_string(),
        UploadError::Protocol { message } => format!("Error: {message}"),
    }
}

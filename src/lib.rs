//! Single-file upload client for a deepfake classification server.
//!
//! A file enters through [`intake`], is posted by [`transport`] while
//! [`state::UploadAttempt`] tracks its phase, and [`presenter`] turns each
//! phase into changes on a [`surface::Surface`]. [`session::UploadSession`]
//! wires the three together.

pub mod cli;
pub mod config;
pub mod error;
pub mod intake;
pub mod models;
pub mod presenter;
pub mod session;
pub mod state;
pub mod surface;
pub mod transport;

pub use config::ClientConfig;
pub use error::UploadError;
pub use intake::{DragEvent, IntakeController};
pub use models::{AttemptId, CandidateFile, Classification, Label, ServerOutcome};
pub use presenter::{render, render_rejection, Banner, View};
pub use session::{Dispatch, UploadSession};
pub use state::{Phase, UploadAttempt};
pub use surface::{RecordingSurface, Surface, TerminalSurface};
pub use transport::{TransportEvent, UploadTransport};

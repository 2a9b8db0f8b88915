use crate::error::UploadError;
use crate::intake::{DragEvent, IntakeController};
use crate::models::{AttemptId, CandidateFile};
use crate::presenter::{render, render_progress, render_rejection};
use crate::state::{Phase, UploadAttempt};
use crate::surface::Surface;
use crate::transport::{TransportEvent, UploadTransport};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

/// What happened to one event taken off the transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Belonged to the current attempt and was rendered (or absorbed by its
    /// state machine).
    Applied(AttemptId),
    /// Came from a superseded attempt and was dropped.
    Stale(AttemptId),
}

/// Drives intake, transport and presentation for one user. All surface
/// mutation happens through `&mut self`, so there is a single writer.
pub struct UploadSession<S: Surface> {
    intake: IntakeController,
    transport: UploadTransport,
    surface: S,
    events_tx: UnboundedSender<(AttemptId, TransportEvent)>,
    events_rx: UnboundedReceiver<(AttemptId, TransportEvent)>,
    current: Option<UploadAttempt>,
    next_id: u64,
}

impl<S: Surface> UploadSession<S> {
    pub fn new(transport: UploadTransport, max_bytes: u64, surface: S) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            intake: IntakeController::new(max_bytes),
            transport,
            surface,
            events_tx,
            events_rx,
            current: None,
            next_id: 1,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn current_attempt(&self) -> Option<&UploadAttempt> {
        self.current.as_ref()
    }

    pub fn phase(&self) -> Option<&Phase> {
        self.current.as_ref().map(UploadAttempt::phase)
    }

    pub fn on_file_chosen(&mut self, file: CandidateFile) -> Result<AttemptId, UploadError> {
        let accepted = self.intake.on_file_chosen(file);
        self.start_or_reject(accepted)
    }

    pub fn on_file_dropped(&mut self, file: CandidateFile) -> Result<AttemptId, UploadError> {
        let accepted = self.intake.on_file_dropped(file);
        self.start_or_reject(accepted)
    }

    /// Feeds a drag event through intake. Returns the outcome of a drop that
    /// carried a file; every other event only moves the drag indicator.
    pub fn on_drag(&mut self, event: DragEvent) -> Option<Result<AttemptId, UploadError>> {
        let accepted = self.intake.on_drag(event);
        self.surface.set_drag_active(self.intake.is_drag_active());
        accepted.map(|accepted| self.start_or_reject(accepted))
    }

    fn start_or_reject(
        &mut self,
        accepted: Result<CandidateFile, UploadError>,
    ) -> Result<AttemptId, UploadError> {
        match accepted {
            Ok(file) => Ok(self.start(file)),
            Err(err) => {
                render_rejection(&err).apply(&mut self.surface);
                Err(err)
            }
        }
    }

    fn start(&mut self, file: CandidateFile) -> AttemptId {
        let id = AttemptId(self.next_id);
        self.next_id += 1;

        if let Some(previous) = &self.current {
            if !previous.phase().is_terminal() {
                debug!(previous = %previous.id(), attempt = %id, "superseding in-flight upload");
            }
        }

        let mut attempt = UploadAttempt::new(id, &file);
        attempt.begin();
        debug!(attempt = %id, name = ?attempt.file_name(), bytes = attempt.total_bytes(), "starting upload");
        render(attempt.phase()).apply(&mut self.surface);
        self.current = Some(attempt);

        self.transport.submit(id, file, self.events_tx.clone());
        id
    }

    /// Waits for the next transport event and applies it. Returns `None`
    /// only if the channel has closed.
    pub async fn pump(&mut self) -> Option<Dispatch> {
        let (id, event) = self.events_rx.recv().await?;
        Some(self.dispatch(id, event))
    }

    /// Pumps until the current attempt reaches a terminal phase.
    pub async fn settle(&mut self) -> Option<&Phase> {
        while self
            .current
            .as_ref()
            .is_some_and(|attempt| !attempt.phase().is_terminal())
        {
            if self.pump().await.is_none() {
                break;
            }
        }
        self.phase()
    }

    fn dispatch(&mut self, id: AttemptId, event: TransportEvent) -> Dispatch {
        let Some(attempt) = self.current.as_mut().filter(|a| a.id() == id) else {
            trace!(attempt = %id, ?event, "dropping event from superseded upload");
            return Dispatch::Stale(id);
        };

        match event {
            TransportEvent::Progress(fraction) => {
                if attempt.record_progress(fraction) {
                    if let Phase::Uploading { fraction: Some(f) } = attempt.phase() {
                        render_progress(*f).apply(&mut self.surface);
                    }
                }
            }
            TransportEvent::Finished(result) => {
                if attempt.finish(result) {
                    render(attempt.phase()).apply(&mut self.surface);
                }
            }
        }
        Dispatch::Applied(id)
    }
}

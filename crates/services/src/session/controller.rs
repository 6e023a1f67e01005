use std::sync::Arc;

use backend::{ExamBackend, SubmissionPayload, SubmitError};
use exam_core::countdown::Tick;
use exam_core::model::{CameraState, ExamSession, ExamStatus, QuestionId, SessionError};
use exam_core::Clock;

use crate::error::{CameraAcquisitionError, CommandError};
use crate::monitor::IntegrityMonitor;
use crate::session::snapshot::SessionSnapshot;

/// Serialized owner of one exam attempt.
///
/// Every signal source (countdown, visibility, camera) and every student
/// command funnels into this one struct, one call at a time; the driver task
/// in this module's sibling guarantees that ordering at runtime. The
/// controller is the sole writer of the session status.
pub struct SessionController {
    session: ExamSession,
    monitor: IntegrityMonitor,
    backend: Arc<dyn ExamBackend>,
    clock: Clock,
}

impl SessionController {
    #[must_use]
    pub fn new(session: ExamSession, backend: Arc<dyn ExamBackend>, clock: Clock) -> Self {
        Self {
            session,
            monitor: IntegrityMonitor::new(),
            backend,
            clock,
        }
    }

    #[must_use]
    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    #[must_use]
    pub fn status(&self) -> ExamStatus {
        self.session.status()
    }

    /// Read-only view for the rendering layer.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session, self.monitor.active_warning(self.clock.now()))
    }

    /// Open the attempt. A zero-length exam auto-submits immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is untouched.
    pub async fn begin(&mut self) -> Result<(), SessionError> {
        let tick = self.session.begin(self.clock.now())?;
        tracing::info!(
            session = %self.session.id(),
            questions = self.session.navigator().len(),
            duration_seconds = self.session.duration_seconds(),
            "exam session started"
        );
        if tick == Tick::Expired {
            self.auto_submit().await;
        }
        Ok(())
    }

    /// One second of wall time. Lapses stale warnings, advances the
    /// countdown, and auto-submits on expiry. Inert once terminal.
    pub async fn tick(&mut self) -> Tick {
        if self.session.status().is_terminal() {
            return Tick::Stopped;
        }

        if self.monitor.expire_warning(self.clock.now()) {
            self.session.acknowledge_violations();
        }

        let tick = self.session.tick();
        if tick == Tick::Expired {
            self.auto_submit().await;
        }
        tick
    }

    /// # Errors
    ///
    /// Returns `SessionError` for terminal sessions or unknown question ids.
    pub fn answer(
        &mut self,
        question: QuestionId,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.session.answer(question, value)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once terminal.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.session.next()
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once terminal.
    pub fn prev(&mut self) -> Result<(), SessionError> {
        self.session.prev()
    }

    /// # Errors
    ///
    /// Returns `SessionError` for terminal sessions or an out-of-range index.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.session.jump_to(index)
    }

    /// Note that camera acquisition is underway.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless in progress.
    pub fn camera_requested(&mut self) -> Result<(), SessionError> {
        if self.session.status() != ExamStatus::InProgress {
            return Err(SessionError::InvalidState {
                status: self.session.status(),
            });
        }
        self.session.set_camera_state(CameraState::RequestedOn);
        Ok(())
    }

    /// The capture device came up.
    pub fn camera_ready(&mut self) {
        if self.session.status().is_terminal() {
            return;
        }
        self.session.set_camera_state(CameraState::On);
        tracing::debug!(session = %self.session.id(), "camera stream up");
    }

    /// Acquisition failed or the stream dropped mid-session. A warning, not a
    /// blocking failure: the exam keeps going.
    pub fn camera_failed(&mut self, error: &CameraAcquisitionError) {
        if self.session.status().is_terminal() {
            return;
        }
        tracing::warn!(session = %self.session.id(), %error, "camera unavailable");
        self.session.set_camera_state(CameraState::Failed);
        let event = self.monitor.camera_dropped(self.clock.now());
        // in-progress is guaranteed by the terminal check above
        let _ = self.session.record_violation(event);
    }

    /// A "hidden" transition from the visibility stream.
    pub fn visibility_hidden(&mut self) {
        if self.session.status() != ExamStatus::InProgress {
            return;
        }
        let now = self.clock.now();
        if let Some(event) = self.monitor.observe_hidden(now) {
            tracing::warn!(session = %self.session.id(), "focus lost during proctored exam");
            let _ = self.session.record_violation(event);
        }
    }

    /// The exam surface became visible again.
    pub fn visibility_visible(&mut self) {
        if self.session.status() != ExamStatus::InProgress {
            return;
        }
        if self.monitor.observe_visible() {
            self.session.acknowledge_violations();
        }
    }

    /// Voluntary submission.
    ///
    /// Stops the countdown before touching the backend so expiry cannot race
    /// the handoff. On a retryable failure the attempt stays in progress with
    /// the countdown re-armed; on rejection the session is failed. Calling
    /// this on a terminal session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` before `begin`, and the backend's
    /// `SubmitError` when the handoff does not land.
    pub async fn submit(&mut self) -> Result<ExamStatus, CommandError> {
        if self.session.status().is_terminal() {
            return Ok(self.session.status());
        }
        if self.session.status() != ExamStatus::InProgress {
            return Err(SessionError::InvalidState {
                status: self.session.status(),
            }
            .into());
        }

        self.session.stop_clock();
        let payload = self.payload();
        match self.backend.submit(&payload).await {
            Ok(ack) => {
                self.session.mark_submitted()?;
                tracing::info!(
                    session = %self.session.id(),
                    receipt = %ack.receipt,
                    answered = self.session.answered_count(),
                    "exam submitted"
                );
                Ok(self.session.status())
            }
            Err(error @ SubmitError::Retryable(_)) => {
                self.session.resume_clock();
                tracing::warn!(session = %self.session.id(), %error, "submission failed, retry available");
                Err(error.into())
            }
            Err(error) => {
                self.session.mark_failed()?;
                tracing::error!(session = %self.session.id(), %error, "submission rejected, session failed");
                Err(error.into())
            }
        }
    }

    /// Countdown expiry: submit whatever answers exist. Terminal either way;
    /// a failed handoff here has no student recourse and is logged for
    /// manual reconciliation.
    async fn auto_submit(&mut self) {
        let payload = self.payload();
        match self.backend.submit(&payload).await {
            Ok(ack) => {
                if self.session.mark_auto_submitted().is_ok() {
                    tracing::info!(
                        session = %self.session.id(),
                        receipt = %ack.receipt,
                        answered = self.session.answered_count(),
                        "time expired, exam auto-submitted"
                    );
                }
            }
            Err(error) => {
                tracing::error!(
                    session = %self.session.id(),
                    %error,
                    answered = self.session.answered_count(),
                    "auto-submission failed after expiry, needs manual reconciliation"
                );
                let _ = self.session.mark_failed();
            }
        }
    }

    fn payload(&self) -> SubmissionPayload {
        SubmissionPayload::new(self.session.id(), self.session.answers().to_map())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

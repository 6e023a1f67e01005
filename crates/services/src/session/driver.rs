use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use exam_core::model::{ExamStatus, QuestionId};

use crate::camera::CameraSource;
use crate::error::{CameraAcquisitionError, CommandError};
use crate::session::controller::SessionController;
use crate::session::snapshot::SessionSnapshot;

/// Signals from the host environment's proctoring sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProctorSignal {
    /// The exam surface went hidden (tab switch, minimize).
    Hidden,
    /// The exam surface is visible again.
    Visible,
    /// The camera stream dropped mid-session.
    CameraLost,
}

enum Command {
    Begin(oneshot::Sender<Result<(), CommandError>>),
    Answer {
        question: QuestionId,
        value: String,
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    Next(oneshot::Sender<Result<(), CommandError>>),
    Prev(oneshot::Sender<Result<(), CommandError>>),
    JumpTo {
        index: usize,
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    RequestCamera(oneshot::Sender<Result<(), CommandError>>),
    Submit(oneshot::Sender<Result<ExamStatus, CommandError>>),
    Close,
}

/// Cloneable command surface for one running session.
///
/// Commands are answered in the order the driver processes them; the snapshot
/// channel carries a fresh view after every processed event.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, CommandError>>) -> Command,
    ) -> Result<T, CommandError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| CommandError::SessionClosed)?;
        response.await.map_err(|_| CommandError::SessionClosed)?
    }

    /// # Errors
    ///
    /// Returns `CommandError` from the controller, or `SessionClosed` when the
    /// driver has already shut down.
    pub async fn begin(&self) -> Result<(), CommandError> {
        self.request(Command::Begin).await
    }

    /// # Errors
    ///
    /// Returns `CommandError` from the controller, or `SessionClosed` when the
    /// driver has already shut down.
    pub async fn answer(
        &self,
        question: QuestionId,
        value: impl Into<String>,
    ) -> Result<(), CommandError> {
        let value = value.into();
        self.request(|reply| Command::Answer {
            question,
            value,
            reply,
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `CommandError` from the controller, or `SessionClosed` when the
    /// driver has already shut down.
    pub async fn next(&self) -> Result<(), CommandError> {
        self.request(Command::Next).await
    }

    /// # Errors
    ///
    /// Returns `CommandError` from the controller, or `SessionClosed` when the
    /// driver has already shut down.
    pub async fn prev(&self) -> Result<(), CommandError> {
        self.request(Command::Prev).await
    }

    /// # Errors
    ///
    /// Returns `CommandError` from the controller, or `SessionClosed` when the
    /// driver has already shut down.
    pub async fn jump_to(&self, index: usize) -> Result<(), CommandError> {
        self.request(|reply| Command::JumpTo { index, reply }).await
    }

    /// Kick off camera acquisition. Resolves once acquisition is underway;
    /// the outcome lands in the snapshot's camera state.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` from the controller, or `SessionClosed` when the
    /// driver has already shut down.
    pub async fn request_camera(&self) -> Result<(), CommandError> {
        self.request(Command::RequestCamera).await
    }

    /// # Errors
    ///
    /// Returns the backend's `SubmitError` when the handoff does not land, or
    /// `SessionClosed` when the driver has already shut down.
    pub async fn submit(&self) -> Result<ExamStatus, CommandError> {
        self.request(Command::Submit).await
    }

    /// Leave the exam screen: stop the loop without submitting anything.
    pub async fn close(&self) {
        let _ = self.commands.send(Command::Close).await;
    }

    /// The most recently published view.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    #[must_use]
    pub fn watch_snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Push side for the host's visibility and camera-liveness streams.
#[derive(Clone)]
pub struct ProctorFeed {
    signals: mpsc::Sender<ProctorSignal>,
}

impl ProctorFeed {
    pub async fn hidden(&self) {
        let _ = self.signals.send(ProctorSignal::Hidden).await;
    }

    pub async fn visible(&self) {
        let _ = self.signals.send(ProctorSignal::Visible).await;
    }

    pub async fn camera_lost(&self) {
        let _ = self.signals.send(ProctorSignal::CameraLost).await;
    }
}

struct SessionDriver {
    controller: SessionController,
    camera: Arc<dyn CameraSource>,
    commands: mpsc::Receiver<Command>,
    signals: mpsc::Receiver<ProctorSignal>,
    camera_outcomes: mpsc::Receiver<Result<(), CameraAcquisitionError>>,
    camera_outcomes_tx: mpsc::Sender<Result<(), CameraAcquisitionError>>,
    snapshots: watch::Sender<SessionSnapshot>,
}

/// Start the actor loop for one attempt.
///
/// The controller is moved into a task that serializes everything touching
/// the session: the 1 Hz countdown drive, proctor signals, and commands. The
/// select is biased towards the timer, so a due expiry always lands before a
/// queued voluntary submit.
pub fn spawn_session(
    controller: SessionController,
    camera: Arc<dyn CameraSource>,
) -> (SessionHandle, ProctorFeed, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(16);
    let (signals_tx, signals_rx) = mpsc::channel(16);
    let (camera_outcomes_tx, camera_outcomes_rx) = mpsc::channel(4);
    let (snapshots_tx, snapshots_rx) = watch::channel(controller.snapshot());

    let driver = SessionDriver {
        controller,
        camera,
        commands: commands_rx,
        signals: signals_rx,
        camera_outcomes: camera_outcomes_rx,
        camera_outcomes_tx,
        snapshots: snapshots_tx,
    };
    let task = tokio::spawn(driver.run());

    (
        SessionHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        },
        ProctorFeed { signals: signals_tx },
        task,
    )
}

impl SessionDriver {
    async fn run(mut self) {
        let mut ticker = time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first interval tick completes immediately; swallow it so the
        // countdown loses its first second a full second after start
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = ticker.tick() => {
                    self.controller.tick().await;
                }
                Some(outcome) = self.camera_outcomes.recv() => {
                    match outcome {
                        Ok(()) => self.controller.camera_ready(),
                        Err(error) => self.controller.camera_failed(&error),
                    }
                }
                Some(signal) = self.signals.recv() => {
                    match signal {
                        ProctorSignal::Hidden => self.controller.visibility_hidden(),
                        ProctorSignal::Visible => self.controller.visibility_visible(),
                        ProctorSignal::CameraLost => self.controller.camera_failed(
                            &CameraAcquisitionError::Other("camera stream dropped".into()),
                        ),
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        // every handle is gone: treat it as leaving the screen
                        None | Some(Command::Close) => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
            }

            self.publish();
            if self.controller.status().is_terminal() {
                break;
            }
        }

        self.camera.release().await;
        self.publish();
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Begin(reply) => {
                let result = self.controller.begin().await.map_err(Into::into);
                let _ = reply.send(result);
            }
            Command::Answer {
                question,
                value,
                reply,
            } => {
                let result = self.controller.answer(question, value).map_err(Into::into);
                let _ = reply.send(result);
            }
            Command::Next(reply) => {
                let _ = reply.send(self.controller.next().map_err(Into::into));
            }
            Command::Prev(reply) => {
                let _ = reply.send(self.controller.prev().map_err(Into::into));
            }
            Command::JumpTo { index, reply } => {
                let _ = reply.send(self.controller.jump_to(index).map_err(Into::into));
            }
            Command::RequestCamera(reply) => {
                let result = self.controller.camera_requested();
                if result.is_ok() {
                    // acquisition may genuinely take a while; run it off-loop
                    // so it cannot hold up ticking or navigation
                    let camera = Arc::clone(&self.camera);
                    let outcomes = self.camera_outcomes_tx.clone();
                    tokio::spawn(async move {
                        let outcome = camera.acquire().await;
                        let _ = outcomes.send(outcome).await;
                    });
                }
                let _ = reply.send(result.map_err(Into::into));
            }
            Command::Submit(reply) => {
                let _ = reply.send(self.controller.submit().await);
            }
            Command::Close => {}
        }
    }

    fn publish(&self) {
        let _ = self.snapshots.send(self.controller.snapshot());
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;
    use exam_core::model::{ExamSession, Question, SessionId};
    use exam_core::Clock;

    fn spawn_exam(
        duration: u32,
        camera: Arc<dyn CameraSource>,
    ) -> (SessionHandle, ProctorFeed, JoinHandle<()>, InMemoryBackend) {
        let questions = vec![
            Question::coding(QuestionId::new(1), "Traversal", "Implement it", 25).unwrap(),
            Question::essay(QuestionId::new(2), "Tradeoffs", "Discuss", 15).unwrap(),
        ];
        let session =
            ExamSession::new(SessionId::generate(), "Algorithms", questions, duration).unwrap();
        let backend = InMemoryBackend::new();
        let controller =
            SessionController::new(session, Arc::new(backend.clone()), Clock::default_clock());
        let (handle, feed, task) = spawn_session(controller, camera);
        (handle, feed, task, backend)
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_auto_submits_through_the_loop() {
        let (handle, _feed, task, backend) = spawn_exam(3, Arc::new(crate::StubCamera::new()));

        handle.begin().await.unwrap();
        handle.answer(QuestionId::new(1), "half done").await.unwrap();

        time::sleep(Duration::from_secs(5)).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.status, ExamStatus::AutoSubmitted);
        assert_eq!(snapshot.remaining_seconds, 0);
        assert_eq!(backend.submission_count(), 1);
        assert_eq!(
            backend.submissions()[0]
                .answers
                .get(&QuestionId::new(1))
                .unwrap(),
            "half done"
        );

        // the loop winds down once terminal; late commands report closure
        task.await.unwrap();
        assert!(matches!(
            handle.submit().await,
            Err(CommandError::SessionClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_without_submitting() {
        let camera = Arc::new(crate::StubCamera::new());
        let (handle, feed, task, backend) = spawn_exam(600, camera.clone());

        handle.begin().await.unwrap();
        handle.request_camera().await.unwrap();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.snapshot().camera_state, exam_core::model::CameraState::On);

        feed.hidden().await;
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.snapshot().violations.len(), 1);

        handle.close().await;
        task.await.unwrap();

        assert_eq!(backend.submission_count(), 0);
        assert!(!camera.is_acquired());
        assert_eq!(handle.snapshot().status, ExamStatus::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn voluntary_submit_terminates_the_loop() {
        let (handle, _feed, task, backend) = spawn_exam(600, Arc::new(crate::StubCamera::new()));

        handle.begin().await.unwrap();
        handle.answer(QuestionId::new(1), "fn main() {}").await.unwrap();
        handle.next().await.unwrap();
        handle.answer(QuestionId::new(2), "tradeoffs essay").await.unwrap();

        let status = handle.submit().await.unwrap();
        assert_eq!(status, ExamStatus::Submitted);
        assert_eq!(backend.submission_count(), 1);
        assert_eq!(backend.submissions()[0].answers.len(), 2);

        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn camera_failure_keeps_the_exam_running() {
        let camera = Arc::new(crate::StubCamera::failing(
            CameraAcquisitionError::PermissionDenied,
        ));
        let (handle, _feed, task, backend) = spawn_exam(600, camera);

        handle.begin().await.unwrap();
        handle.request_camera().await.unwrap();
        time::sleep(Duration::from_millis(100)).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.status, ExamStatus::InProgress);
        assert_eq!(snapshot.camera_state, exam_core::model::CameraState::Failed);
        assert_eq!(snapshot.violations.len(), 1);
        assert_eq!(backend.submission_count(), 0);

        handle.close().await;
        task.await.unwrap();
    }
}

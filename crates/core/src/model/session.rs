use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::countdown::{Countdown, Tick};
use crate::model::answers::AnswerStore;
use crate::model::ids::{QuestionId, SessionId};
use crate::model::integrity::{CameraState, IntegrityEvent};
use crate::model::navigator::{NavigationError, QuestionNavigator};
use crate::model::question::Question;

/// Lifecycle of an exam attempt. `Submitted`, `AutoSubmitted` and `Failed`
/// are terminal; no mutation is accepted afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamStatus {
    NotStarted,
    InProgress,
    Submitted,
    AutoSubmitted,
    Failed,
}

impl ExamStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExamStatus::Submitted | ExamStatus::AutoSubmitted | ExamStatus::Failed
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session is {status:?}, mutation is not allowed")]
    InvalidState { status: ExamStatus },

    #[error("question {0} is not part of this exam")]
    UnknownQuestion(QuestionId),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

//
// ─── EXAM SESSION ──────────────────────────────────────────────────────────────
//

/// Aggregate root for one proctored attempt.
///
/// Owns the question walk, the answer capture, the countdown and the
/// violation log. Status transitions happen only through the `mark_*`
/// methods; the controller in the services layer is their sole caller.
pub struct ExamSession {
    id: SessionId,
    title: String,
    navigator: QuestionNavigator,
    answers: AnswerStore,
    countdown: Countdown,
    violations: Vec<IntegrityEvent>,
    camera_state: CameraState,
    status: ExamStatus,
    started_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Create a fresh attempt over the given questions.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Empty` (wrapped) when no questions are given.
    pub fn new(
        id: SessionId,
        title: impl Into<String>,
        questions: Vec<Question>,
        duration_seconds: u32,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            id,
            title: title.into(),
            navigator: QuestionNavigator::new(questions)?,
            answers: AnswerStore::new(),
            countdown: Countdown::new(duration_seconds),
            violations: Vec::new(),
            camera_state: CameraState::Off,
            status: ExamStatus::NotStarted,
            started_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn status(&self) -> ExamStatus {
        self.status
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn navigator(&self) -> &QuestionNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    #[must_use]
    pub fn violations(&self) -> &[IntegrityEvent] {
        &self.violations
    }

    #[must_use]
    pub fn camera_state(&self) -> CameraState {
        self.camera_state
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.countdown.duration_seconds()
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.countdown.remaining_seconds()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        self.navigator.current()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.answered_count()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.answers.unanswered_count(self.navigator.len())
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.status == ExamStatus::InProgress {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                status: self.status,
            })
        }
    }

    /// Open the attempt and arm the countdown.
    ///
    /// A zero-length exam expires right away; the returned tick carries that.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is untouched.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<Tick, SessionError> {
        if self.status != ExamStatus::NotStarted {
            return Err(SessionError::InvalidState {
                status: self.status,
            });
        }
        self.status = ExamStatus::InProgress;
        self.started_at = Some(now);
        Ok(self.countdown.start())
    }

    /// Advance the countdown by one second. Inert once terminal.
    pub fn tick(&mut self) -> Tick {
        if self.status != ExamStatus::InProgress {
            return Tick::Stopped;
        }
        self.countdown.tick()
    }

    /// Record the student's answer for a question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once terminal and
    /// `SessionError::UnknownQuestion` for an id outside this exam.
    pub fn answer(
        &mut self,
        question: QuestionId,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if !self.navigator.questions().iter().any(|q| q.id() == question) {
            return Err(SessionError::UnknownQuestion(question));
        }
        self.answers.set(question, value);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once terminal.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.navigator.next();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once terminal.
    pub fn prev(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.navigator.prev();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once terminal and
    /// `NavigationError::OutOfRange` (wrapped) for a bad index.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.navigator.jump_to(index)?;
        Ok(())
    }

    /// Append a violation to the log. The log is append-only; entries are
    /// never removed, only acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once terminal.
    pub fn record_violation(&mut self, event: IntegrityEvent) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.violations.push(event);
        Ok(())
    }

    /// Mark every outstanding violation as acknowledged.
    pub fn acknowledge_violations(&mut self) {
        for event in &mut self.violations {
            event.acknowledge();
        }
    }

    pub fn set_camera_state(&mut self, state: CameraState) {
        self.camera_state = state;
    }

    /// Halt the countdown ahead of a submission attempt.
    pub fn stop_clock(&mut self) {
        self.countdown.stop();
    }

    /// Re-arm the countdown after a submission attempt that did not land.
    pub fn resume_clock(&mut self) {
        self.countdown.resume();
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless in progress.
    pub fn mark_submitted(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.countdown.stop();
        self.status = ExamStatus::Submitted;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless in progress.
    pub fn mark_auto_submitted(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.countdown.stop();
        self.status = ExamStatus::AutoSubmitted;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless in progress.
    pub fn mark_failed(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.countdown.stop();
        self.status = ExamStatus::Failed;
        Ok(())
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("questions", &self.navigator.len())
            .field("current", &self.navigator.current_index())
            .field("answered", &self.answers.answered_count())
            .field("remaining_seconds", &self.countdown.remaining_seconds())
            .field("violations", &self.violations.len())
            .field("camera_state", &self.camera_state)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

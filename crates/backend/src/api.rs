use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use exam_core::model::{QuestionId, SessionId};

/// Errors a backend can return when accepting a finalized submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitError {
    /// Transient transport trouble; the same submission may be retried.
    #[error("submission did not reach the server: {0}")]
    Retryable(String),

    /// The server refused the attempt outright (session closed, auth expired).
    #[error("submission rejected by the server: {0}")]
    Rejected(String),
}

impl SubmitError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Retryable(_))
    }
}

/// Finalized answer set for one attempt.
///
/// Keyed by question so the wire form is order-stable; serialization must
/// round-trip exactly, nothing else about the format is load-bearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub session_id: SessionId,
    pub answers: BTreeMap<QuestionId, String>,
}

impl SubmissionPayload {
    #[must_use]
    pub fn new(session_id: SessionId, answers: BTreeMap<QuestionId, String>) -> Self {
        Self {
            session_id,
            answers,
        }
    }
}

/// Server acknowledgment for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    pub receipt: String,
    pub received_at: DateTime<Utc>,
}

/// Collaborator that takes custody of a finalized submission.
///
/// The engine calls this at most once per attempt; rejecting a second
/// concurrent attempt for the same session id is the server's business.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// Deliver a finalized submission.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Retryable` for transient delivery trouble and
    /// `SubmitError::Rejected` when the server will not take the attempt.
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitAck, SubmitError>;
}

/// In-memory backend for tests and prototyping.
///
/// Records every accepted submission and can be scripted with a queue of
/// failures that are served before any acceptance.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    submissions: Arc<Mutex<Vec<SubmissionPayload>>>,
    failures: Arc<Mutex<VecDeque<SubmitError>>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next `submit` call.
    pub fn push_failure(&self, error: SubmitError) {
        if let Ok(mut guard) = self.failures.lock() {
            guard.push_back(error);
        }
    }

    /// Submissions accepted so far, in arrival order.
    #[must_use]
    pub fn submissions(&self) -> Vec<SubmissionPayload> {
        self.submissions
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ExamBackend for InMemoryBackend {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitAck, SubmitError> {
        let scripted = {
            let mut guard = self
                .failures
                .lock()
                .map_err(|e| SubmitError::Retryable(e.to_string()))?;
            guard.pop_front()
        };
        if let Some(error) = scripted {
            return Err(error);
        }

        let mut guard = self
            .submissions
            .lock()
            .map_err(|e| SubmitError::Retryable(e.to_string()))?;
        guard.push(payload.clone());
        Ok(SubmitAck {
            receipt: format!("receipt-{}", guard.len()),
            received_at: Utc::now(),
        })
    }
}

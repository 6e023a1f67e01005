use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::api::{ExamBackend, SubmissionPayload, SubmitAck, SubmitError};

/// Connection settings for the HTTP exam backend.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl BackendConfig {
    /// Read configuration from `EXAM_BACKEND_URL` / `EXAM_BACKEND_TOKEN`.
    ///
    /// Returns `None` when no backend URL is configured; callers are expected
    /// to fall back to an in-memory backend.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EXAM_BACKEND_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let auth_token = env::var("EXAM_BACKEND_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Some(Self {
            base_url,
            auth_token,
        })
    }
}

/// `ExamBackend` over HTTP: one JSON POST per submission.
#[derive(Clone)]
pub struct HttpExamBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpExamBackend {
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build a backend from the environment, if configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        BackendConfig::from_env().map(Self::new)
    }
}

#[async_trait]
impl ExamBackend for HttpExamBackend {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitAck, SubmitError> {
        let url = format!(
            "{}/sessions/{}/submission",
            self.config.base_url.trim_end_matches('/'),
            payload.session_id
        );

        let mut request = self.client.post(url).json(payload);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SubmitError::Retryable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<SubmitAck>()
                .await
                .map_err(|e| SubmitError::Retryable(e.to_string()));
        }

        Err(classify_status(status))
    }
}

/// Map a non-success status onto the submit taxonomy. Statuses that say the
/// attempt itself is dead are rejections; everything else is worth retrying.
fn classify_status(status: StatusCode) -> SubmitError {
    match status {
        StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::CONFLICT
        | StatusCode::GONE => SubmitError::Rejected(format!("server closed the attempt ({status})")),
        _ => SubmitError::Retryable(format!("unexpected status {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitive_statuses_are_rejections() {
        assert!(!classify_status(StatusCode::UNAUTHORIZED).is_retryable());
        assert!(!classify_status(StatusCode::CONFLICT).is_retryable());
        assert!(!classify_status(StatusCode::GONE).is_retryable());
    }

    #[test]
    fn transient_statuses_stay_retryable() {
        assert!(classify_status(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS).is_retryable());
    }
}

#![forbid(unsafe_code)]

pub mod api;
pub mod http;

pub use api::{ExamBackend, InMemoryBackend, SubmissionPayload, SubmitAck, SubmitError};
pub use http::{BackendConfig, HttpExamBackend};

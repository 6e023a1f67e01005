//! Shared error types for the services crate.

use thiserror::Error;

use backend::SubmitError;
use exam_core::model::SessionError;

/// Why the proctoring camera could not be (or stay) acquired.
///
/// Never fatal: the session degrades to a camera warning and keeps going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CameraAcquisitionError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no capture device available")]
    NoDevice,

    #[error("capture device is busy")]
    DeviceBusy,

    #[error("camera failure: {0}")]
    Other(String),
}

/// Errors surfaced through the session command surface.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommandError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("session driver is no longer running")]
    SessionClosed,
}

#![forbid(unsafe_code)]

pub mod camera;
pub mod error;
pub mod monitor;
pub mod session;

pub use exam_core::Clock;

pub use camera::{CameraSource, StubCamera};
pub use error::{CameraAcquisitionError, CommandError};
pub use monitor::{ActiveWarning, IntegrityMonitor};
pub use session::{
    ProctorFeed, QuestionMark, SessionController, SessionHandle, SessionSnapshot, spawn_session,
};

mod controller;
mod driver;
mod snapshot;

// Public API of the session subsystem.
pub use controller::SessionController;
pub use driver::{ProctorFeed, ProctorSignal, SessionHandle, spawn_session};
pub use snapshot::{QuestionMark, SessionSnapshot, TIME_CRITICAL_SECONDS};

mod answers;
mod ids;
mod integrity;
mod navigator;
mod question;
mod session;

pub use answers::AnswerStore;
pub use ids::{ParseIdError, QuestionId, SessionId};
pub use integrity::{CameraState, IntegrityEvent, IntegrityEventKind};
pub use navigator::{NavigationError, QuestionNavigator};
pub use question::{Question, QuestionError, QuestionKind};
pub use session::{ExamSession, ExamStatus, SessionError};

use thiserror::Error;

use crate::model::{NavigationError, QuestionError, SessionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

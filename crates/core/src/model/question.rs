use thiserror::Error;

use crate::model::ids::QuestionId;

/// The answering modality of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
    Coding,
    Essay,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question title is empty")]
    EmptyTitle,

    #[error("multiple-choice question needs at least two options, got {0}")]
    NotEnoughOptions(usize),

    #[error("only multiple-choice questions carry options")]
    UnexpectedOptions,
}

/// A single exam question. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    title: String,
    description: String,
    kind: QuestionKind,
    options: Vec<String>,
    points: u32,
}

impl Question {
    /// Build a question, validating the kind/options pairing.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyTitle` for a blank title,
    /// `QuestionError::NotEnoughOptions` for a choice question with fewer than
    /// two options, and `QuestionError::UnexpectedOptions` when a non-choice
    /// question carries options.
    pub fn new(
        id: QuestionId,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: QuestionKind,
        options: Vec<String>,
        points: u32,
    ) -> Result<Self, QuestionError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuestionError::EmptyTitle);
        }

        match kind {
            QuestionKind::MultipleChoice if options.len() < 2 => {
                return Err(QuestionError::NotEnoughOptions(options.len()));
            }
            QuestionKind::Coding | QuestionKind::Essay if !options.is_empty() => {
                return Err(QuestionError::UnexpectedOptions);
            }
            _ => {}
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            kind,
            options,
            points,
        })
    }

    /// Shorthand for a multiple-choice question.
    ///
    /// # Errors
    ///
    /// Same validation as [`Question::new`].
    pub fn multiple_choice(
        id: QuestionId,
        title: impl Into<String>,
        description: impl Into<String>,
        options: Vec<String>,
        points: u32,
    ) -> Result<Self, QuestionError> {
        Self::new(id, title, description, QuestionKind::MultipleChoice, options, points)
    }

    /// Shorthand for a coding question.
    ///
    /// # Errors
    ///
    /// Same validation as [`Question::new`].
    pub fn coding(
        id: QuestionId,
        title: impl Into<String>,
        description: impl Into<String>,
        points: u32,
    ) -> Result<Self, QuestionError> {
        Self::new(id, title, description, QuestionKind::Coding, Vec::new(), points)
    }

    /// Shorthand for an essay question.
    ///
    /// # Errors
    ///
    /// Same validation as [`Question::new`].
    pub fn essay(
        id: QuestionId,
        title: impl Into<String>,
        description: impl Into<String>,
        points: u32,
    ) -> Result<Self, QuestionError> {
        Self::new(id, title, description, QuestionKind::Essay, Vec::new(), points)
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    /// Answer options; empty for coding and essay questions.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_title() {
        let err = Question::essay(QuestionId::new(1), "   ", "desc", 5).unwrap_err();
        assert_eq!(err, QuestionError::EmptyTitle);
    }

    #[test]
    fn multiple_choice_requires_two_options() {
        let err = Question::multiple_choice(
            QuestionId::new(1),
            "Complexity",
            "Pick one",
            vec!["O(n)".into()],
            10,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::NotEnoughOptions(1));
    }

    #[test]
    fn coding_question_must_not_carry_options() {
        let err = Question::new(
            QuestionId::new(1),
            "Traversal",
            "Implement it",
            QuestionKind::Coding,
            vec!["a".into(), "b".into()],
            25,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::UnexpectedOptions);
    }

    #[test]
    fn valid_multiple_choice_keeps_options_in_order() {
        let question = Question::multiple_choice(
            QuestionId::new(2),
            "Complexity",
            "Time complexity of merge sort?",
            vec!["O(n)".into(), "O(n log n)".into()],
            10,
        )
        .unwrap();

        assert_eq!(question.kind(), QuestionKind::MultipleChoice);
        assert_eq!(question.options(), ["O(n)", "O(n log n)"]);
        assert_eq!(question.points(), 10);
    }
}

use std::collections::BTreeMap;

use crate::model::ids::QuestionId;

/// Per-question answer capture.
///
/// A plain map: navigation never goes through here, so moving between
/// questions can never drop an answer. Status guards live on the session
/// aggregate that owns this store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    entries: BTreeMap<QuestionId, String>,
}

impl AnswerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the answer for a question.
    pub fn set(&mut self, question: QuestionId, value: impl Into<String>) {
        self.entries.insert(question, value.into());
    }

    /// The stored answer, or `None` while the question is unanswered.
    #[must_use]
    pub fn get(&self, question: QuestionId) -> Option<&str> {
        self.entries.get(&question).map(String::as_str)
    }

    #[must_use]
    pub fn is_answered(&self, question: QuestionId) -> bool {
        self.entries.contains_key(&question)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries.len()
    }

    /// Questions without an answer, given the total question count.
    #[must_use]
    pub fn unanswered_count(&self, total_questions: usize) -> usize {
        total_questions.saturating_sub(self.entries.len())
    }

    /// Snapshot of the current contents, keyed by question.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<QuestionId, String> {
        self.entries.clone()
    }
}

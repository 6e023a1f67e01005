use exam_core::countdown::format_hms;
use exam_core::model::{CameraState, ExamSession, ExamStatus, IntegrityEvent, Question};

use crate::monitor::ActiveWarning;

/// Remaining time below this many seconds is flagged as urgent.
pub const TIME_CRITICAL_SECONDS: u32 = 600;

/// How a question slot renders in the navigator grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionMark {
    Current,
    Answered,
    Unanswered,
}

/// Read-only view of the attempt, assembled for the rendering layer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: ExamStatus,
    pub title: String,
    pub remaining_seconds: u32,
    pub remaining_formatted: String,
    pub time_critical: bool,
    pub current_question: Question,
    pub current_index: usize,
    pub total_questions: usize,
    pub progress: f64,
    pub answered_count: usize,
    pub unanswered_count: usize,
    pub question_marks: Vec<QuestionMark>,
    pub violations: Vec<IntegrityEvent>,
    pub camera_state: CameraState,
    pub active_warning: Option<ActiveWarning>,
}

impl SessionSnapshot {
    pub(crate) fn capture(session: &ExamSession, active_warning: Option<ActiveWarning>) -> Self {
        let navigator = session.navigator();
        let remaining = session.remaining_seconds();
        let question_marks = navigator
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                if index == navigator.current_index() {
                    QuestionMark::Current
                } else if session.answers().is_answered(question.id()) {
                    QuestionMark::Answered
                } else {
                    QuestionMark::Unanswered
                }
            })
            .collect();

        Self {
            status: session.status(),
            title: session.title().to_owned(),
            remaining_seconds: remaining,
            remaining_formatted: format_hms(remaining),
            time_critical: remaining < TIME_CRITICAL_SECONDS,
            current_question: session.current_question().clone(),
            current_index: navigator.current_index(),
            total_questions: navigator.len(),
            progress: navigator.progress(),
            answered_count: session.answered_count(),
            unanswered_count: session.unanswered_count(),
            question_marks,
            violations: session.violations().to_vec(),
            camera_state: session.camera_state(),
            active_warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{QuestionId, SessionId};
    use exam_core::time::fixed_now;

    fn build_session() -> ExamSession {
        let questions = vec![
            Question::coding(QuestionId::new(1), "Traversal", "Implement it", 25).unwrap(),
            Question::multiple_choice(
                QuestionId::new(2),
                "Complexity",
                "Pick one",
                vec!["O(n)".into(), "O(n log n)".into()],
                10,
            )
            .unwrap(),
            Question::essay(QuestionId::new(3), "Tradeoffs", "Discuss", 15).unwrap(),
        ];
        ExamSession::new(SessionId::generate(), "Algorithms", questions, 7200).unwrap()
    }

    #[test]
    fn marks_follow_cursor_and_answers() {
        let mut session = build_session();
        session.begin(fixed_now()).unwrap();
        session.answer(QuestionId::new(3), "essay text").unwrap();
        session.next().unwrap();

        let snapshot = SessionSnapshot::capture(&session, None);
        assert_eq!(
            snapshot.question_marks,
            vec![
                QuestionMark::Unanswered,
                QuestionMark::Current,
                QuestionMark::Answered,
            ]
        );
        assert_eq!(snapshot.answered_count, 1);
        assert_eq!(snapshot.unanswered_count, 2);
        assert_eq!(snapshot.current_index, 1);
    }

    #[test]
    fn formats_the_countdown_and_urgency() {
        let mut session = build_session();
        session.begin(fixed_now()).unwrap();

        let snapshot = SessionSnapshot::capture(&session, None);
        assert_eq!(snapshot.remaining_formatted, "02:00:00");
        assert!(!snapshot.time_critical);

        for _ in 0..6700 {
            session.tick();
        }
        let snapshot = SessionSnapshot::capture(&session, None);
        assert_eq!(snapshot.remaining_seconds, 500);
        assert!(snapshot.time_critical);
    }
}

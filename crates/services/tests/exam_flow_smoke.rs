use std::sync::Arc;

use backend::InMemoryBackend;
use exam_core::model::{ExamSession, ExamStatus, Question, QuestionId, SessionId};
use exam_core::time::fixed_clock;
use services::{QuestionMark, SessionController};

fn build_exam() -> ExamSession {
    let questions = vec![
        Question::coding(
            QuestionId::new(1),
            "Binary Tree Traversal",
            "Implement an in-order traversal of a binary tree",
            25,
        )
        .unwrap(),
        Question::multiple_choice(
            QuestionId::new(2),
            "Algorithm Complexity",
            "What is the time complexity of merge sort?",
            vec![
                "O(n)".into(),
                "O(n log n)".into(),
                "O(n²)".into(),
                "O(log n)".into(),
            ],
            10,
        )
        .unwrap(),
    ];
    ExamSession::new(
        SessionId::generate(),
        "Data Structures and Algorithms",
        questions,
        7200,
    )
    .unwrap()
}

#[tokio::test]
async fn full_voluntary_flow_reaches_the_backend() {
    let backend = InMemoryBackend::new();
    let mut controller =
        SessionController::new(build_exam(), Arc::new(backend.clone()), fixed_clock());

    controller.begin().await.unwrap();

    // work through the paper with some back-and-forth
    controller
        .answer(QuestionId::new(1), "fn in_order(root: &Node) { /* ... */ }")
        .unwrap();
    controller.next().unwrap();
    controller.answer(QuestionId::new(2), "O(n)").unwrap();
    controller.prev().unwrap();
    controller.next().unwrap();
    controller.answer(QuestionId::new(2), "O(n log n)").unwrap();

    // a tab switch along the way is recorded but does not block anything
    controller.visibility_hidden();
    controller.visibility_visible();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.answered_count, 2);
    assert_eq!(snapshot.unanswered_count, 0);
    assert_eq!(snapshot.remaining_formatted, "02:00:00");
    assert_eq!(
        snapshot.question_marks,
        vec![QuestionMark::Answered, QuestionMark::Current]
    );
    assert_eq!(snapshot.violations.len(), 1);

    let status = controller.submit().await.unwrap();
    assert_eq!(status, ExamStatus::Submitted);

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    let payload = &submissions[0];
    assert_eq!(
        payload.answers.get(&QuestionId::new(2)).unwrap(),
        "O(n log n)"
    );
    assert_eq!(payload.answers.len(), 2);

    // a late expiry signal cannot reopen the attempt
    controller.tick().await;
    assert_eq!(controller.status(), ExamStatus::Submitted);
    assert_eq!(backend.submission_count(), 1);
}

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use backend::{ExamBackend, HttpExamBackend, InMemoryBackend};
use exam_core::Clock;
use exam_core::model::{ExamSession, Question, QuestionId, SessionId};
use services::{SessionController, StubCamera, spawn_session};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDuration { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

struct Args {
    duration_seconds: u32,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--duration <seconds>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --duration 7200");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DURATION_SECS, EXAM_BACKEND_URL, EXAM_BACKEND_TOKEN, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut duration_seconds = std::env::var("EXAM_DURATION_SECS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(7200);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--duration" => {
                    let value = args.next().ok_or(ArgsError::MissingValue {
                        flag: "--duration",
                    })?;
                    duration_seconds = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDuration { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { duration_seconds })
    }
}

/// The default demo paper.
fn demo_paper() -> Result<Vec<Question>, Box<dyn std::error::Error>> {
    Ok(vec![
        Question::coding(
            QuestionId::new(1),
            "Binary Tree Traversal",
            "Implement an in-order traversal of a binary tree",
            25,
        )?,
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
        )?,
    ])
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Real backend when configured, in-memory recording otherwise. Keep this
    // choice in the binary glue so core/services stay pure.
    let backend: Arc<dyn ExamBackend> = match HttpExamBackend::from_env() {
        Some(http) => {
            tracing::info!("submitting to the configured HTTP backend");
            Arc::new(http)
        }
        None => {
            tracing::info!("EXAM_BACKEND_URL not set, recording submissions in memory");
            Arc::new(InMemoryBackend::new())
        }
    };

    let session = ExamSession::new(
        SessionId::generate(),
        "Data Structures and Algorithms",
        demo_paper()?,
        args.duration_seconds,
    )?;
    let session_id = session.id();
    let controller = SessionController::new(session, backend, Clock::default_clock());
    let (handle, feed, task) = spawn_session(controller, Arc::new(StubCamera::new()));

    tracing::info!(%session_id, "running a scripted proctored attempt");
    handle.begin().await?;
    handle.request_camera().await?;

    handle
        .answer(QuestionId::new(1), "fn in_order(root: &Node) { /* ... */ }")
        .await?;
    handle.next().await?;
    handle.answer(QuestionId::new(2), "O(n log n)").await?;

    // wander off and come back, the way the proctoring sources would see it
    feed.hidden().await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    feed.visible().await;

    let snapshot = handle.snapshot();
    tracing::info!(
        remaining = %snapshot.remaining_formatted,
        answered = snapshot.answered_count,
        violations = snapshot.violations.len(),
        camera = ?snapshot.camera_state,
        "mid-session state"
    );

    let status = handle.submit().await?;
    tracing::info!(?status, "attempt finished");

    task.await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

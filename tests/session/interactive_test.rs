//! Tests for interactive (manual clause selection) sessions.

use vampire_supervisor::engine::RunMode;
use vampire_supervisor::protocol::ParseError;
use vampire_supervisor::session::{EngineSession, EngineState, SelectError, SessionError};

use crate::fake::{pid_alive, FakeEngine, LOOPING_ENGINE, REFUTING_ENGINE, SATURATING_ENGINE};

#[tokio::test]
async fn stops_at_first_clause_request() {
    let engine = FakeEngine::new(SATURATING_ENGINE);
    let mut session = EngineSession::new(engine.config());

    let lines = session.start_interactive(engine.problem()).await;

    assert_eq!(session.state(), EngineState::AwaitingChoice);
    assert_eq!(session.mode(), Some(RunMode::Interactive));
    assert_eq!(session.pending_choices(), &[2, 1]);
    assert!(session.offers(1));
    assert!(!session.offers(3));
    assert!(session.process_id().is_some());
    assert_eq!(
        lines,
        vec![
            "% Running in manual clause selection mode",
            "[SA] new: 1. p(a) [input]",
            "[SA] new: 2. q(b) [input]",
        ]
    );

    session.close().await;
}

#[tokio::test]
async fn select_then_satisfiable_saturates() {
    let engine = FakeEngine::new(SATURATING_ENGINE);
    let mut session = EngineSession::new(engine.config());
    session.start_interactive(engine.problem()).await;

    let lines = session.select(2).await.unwrap();

    assert_eq!(lines, vec!["[SA] active: 2"]);
    assert_eq!(session.state(), EngineState::Saturated);
    assert!(session.pending_choices().is_empty());
    assert!(session.process_id().is_none());
    assert_eq!(session.rounds(), 1);
}

#[tokio::test]
async fn terminal_state_rejects_further_choices() {
    let engine = FakeEngine::new(SATURATING_ENGINE);
    let mut session = EngineSession::new(engine.config());
    session.start_interactive(engine.problem()).await;
    session.supply_choice(1).await.unwrap();

    let err = session.select(1).await.unwrap_err();

    assert_eq!(
        err,
        SelectError::NotAwaitingChoice {
            state: EngineState::Saturated
        }
    );
    assert_eq!(session.state(), EngineState::Saturated);
}

#[tokio::test]
async fn batches_concatenate_to_automatic_output() {
    let engine = FakeEngine::new(REFUTING_ENGINE);

    let mut automatic = EngineSession::new(engine.config());
    let full = automatic.start(engine.problem()).await;
    assert_eq!(automatic.state(), EngineState::Refuted);
    let verdict_at = full
        .iter()
        .position(|line| line.starts_with("% Refutation found."))
        .unwrap();

    let mut interactive = EngineSession::new(engine.config());
    let mut collected = interactive.begin_interactive(engine.problem()).await;
    assert_eq!(interactive.pending_choices(), &[1, 2]);
    collected.extend(interactive.select(1).await.unwrap());
    assert_eq!(interactive.pending_choices(), &[2]);
    collected.extend(interactive.select(2).await.unwrap());

    assert_eq!(interactive.state(), EngineState::Refuted);
    assert_eq!(interactive.rounds(), 2);
    assert_eq!(collected, full[..verdict_at].to_vec());
}

#[tokio::test]
async fn malformed_clause_list_fails() {
    let engine = FakeEngine::new(
        r#"
echo "% started"
echo "Pick a clause from: 3,x,12,"
read c
"#,
    );
    let mut session = EngineSession::new(engine.config());

    let lines = session.start_interactive(engine.problem()).await;

    assert_eq!(lines, vec!["% started"]);
    assert_eq!(session.state(), EngineState::Failed);
    assert!(session.pending_choices().is_empty());
    assert!(session.process_id().is_none());
    match session.failure() {
        Some(SessionError::Parse(ParseError { line, token })) => {
            assert_eq!(line, "Pick a clause from: 3,x,12,");
            assert_eq!(token, "x");
        }
        other => panic!("Expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn user_error_fails_and_excludes_marker_line() {
    let engine = FakeEngine::new(
        r#"
echo "% reading problem"
echo "User error: Unsupported logic"
"#,
    );
    let mut session = EngineSession::new(engine.config());

    let lines = session.start_interactive(engine.problem()).await;

    assert_eq!(lines, vec!["% reading problem"]);
    assert_eq!(session.state(), EngineState::Failed);
    match session.failure() {
        Some(SessionError::Engine { message }) => {
            assert_eq!(message, "User error: Unsupported logic");
        }
        other => panic!("Expected engine error, got {other:?}"),
    }
}

#[tokio::test]
async fn stderr_error_before_clause_request_fails() {
    let engine = FakeEngine::new(
        r#"
echo "% reading problem"
echo "User error: Unsupported logic" >&2
echo "Pick a clause from: 1,"
read c
"#,
    );
    let mut session = EngineSession::new(engine.config());

    let lines = session.start_interactive(engine.problem()).await;

    assert_eq!(lines, vec!["% reading problem"]);
    assert_eq!(session.state(), EngineState::Failed);
    assert!(session.pending_choices().is_empty());
    assert!(session.process_id().is_none());
}

#[tokio::test]
async fn exit_without_marker_is_protocol_exhaustion() {
    let engine = FakeEngine::new(
        r#"
echo "% one"
echo "% two"
"#,
    );
    let mut session = EngineSession::new(engine.config());

    let lines = session.start_interactive(engine.problem()).await;

    assert_eq!(lines, vec!["% one", "% two"]);
    assert_eq!(session.state(), EngineState::Failed);
    assert!(matches!(
        session.failure(),
        Some(SessionError::ProtocolExhaustion)
    ));
    assert!(session.process_id().is_none());
}

#[tokio::test]
async fn unoffered_choice_is_forwarded() {
    let engine = FakeEngine::new(LOOPING_ENGINE);
    let mut session = EngineSession::new(engine.config());
    session.start_interactive(engine.problem()).await;

    let lines = session.select(99).await.unwrap();

    assert_eq!(lines, vec!["[SA] active: 99"]);
    assert_eq!(session.state(), EngineState::AwaitingChoice);
    assert_eq!(session.pending_choices(), &[4, 5]);

    session.close().await;
}

#[tokio::test]
async fn engine_dying_before_choice_fails() {
    let engine = FakeEngine::new(
        r#"
echo "Pick a clause from: 1,"
exit 0
"#,
    );
    let mut session = EngineSession::new(engine.config());
    session.start_interactive(engine.problem()).await;
    assert_eq!(session.state(), EngineState::AwaitingChoice);

    let lines = session.select(1).await.unwrap();

    assert!(lines.is_empty());
    assert_eq!(session.state(), EngineState::Failed);
    assert!(session.process_id().is_none());
}

#[tokio::test]
async fn restart_kills_previous_process() {
    let engine = FakeEngine::new(LOOPING_ENGINE);
    let mut session = EngineSession::new(engine.config());

    session.start_interactive(engine.problem()).await;
    let first_pid = session.process_id().unwrap();
    let first_run = session.run_id().unwrap();
    assert!(pid_alive(first_pid));

    session.start_interactive(engine.problem()).await;
    let second_pid = session.process_id().unwrap();

    assert!(!pid_alive(first_pid));
    assert!(pid_alive(second_pid));
    assert_ne!(first_pid, second_pid);
    assert_ne!(session.run_id().unwrap(), first_run);
    assert_eq!(session.state(), EngineState::AwaitingChoice);
    assert_eq!(session.rounds(), 0);

    session.close().await;
    assert!(!pid_alive(second_pid));
}

#[tokio::test]
async fn automatic_restart_replaces_interactive_run() {
    let engine = FakeEngine::new(REFUTING_ENGINE);
    let mut session = EngineSession::new(engine.config());

    session.start_interactive(engine.problem()).await;
    let interactive_pid = session.process_id().unwrap();
    assert_eq!(session.state(), EngineState::AwaitingChoice);

    session.start(engine.problem()).await;

    assert!(!pid_alive(interactive_pid));
    assert_eq!(session.state(), EngineState::Refuted);
    assert!(session.pending_choices().is_empty());
    assert!(session.process_id().is_none());
}

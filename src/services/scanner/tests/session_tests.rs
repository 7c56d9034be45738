use super::*;

fn awaiting_session(files_at_start: usize) -> ScanSession {
    let mut session = ScanSession::new();
    session.begin().unwrap();
    assert!(session.configured());
    assert!(session.accepted(files_at_start));
    session
}

#[test]
fn happy_path_walks_the_full_graph() {
    let mut session = ScanSession::new();
    assert_eq!(session.state(), ScanSessionState::Idle);

    session.begin().unwrap();
    assert_eq!(session.state(), ScanSessionState::Configuring);
    assert!(session.id().is_some());
    assert!(session.started_at().is_some());

    assert!(session.configured());
    assert_eq!(session.state(), ScanSessionState::Scanning);

    assert!(session.accepted(3));
    assert_eq!(session.state(), ScanSessionState::AwaitingFiles);
    assert_eq!(session.files_count_at_start(), 3);

    assert_eq!(session.observe_count(5), Some(2));
    assert_eq!(session.state(), ScanSessionState::Completed);

    assert!(session.reset());
    assert_eq!(session.state(), ScanSessionState::Idle);
}

#[test]
fn begin_is_rejected_while_active_without_state_change() {
    let mut session = awaiting_session(0);
    let err = session.begin().unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(session.state(), ScanSessionState::AwaitingFiles);
}

#[test]
fn observe_count_ignores_flat_or_lower_counts() {
    let mut session = awaiting_session(3);
    assert_eq!(session.observe_count(3), None);
    assert_eq!(session.observe_count(2), None);
    assert_eq!(session.state(), ScanSessionState::AwaitingFiles);
    assert_eq!(session.observe_count(4), Some(1));
}

#[test]
fn observe_count_outside_awaiting_is_ignored() {
    let mut session = ScanSession::new();
    assert_eq!(session.observe_count(10), None);
    assert_eq!(session.state(), ScanSessionState::Idle);

    session.begin().unwrap();
    assert_eq!(session.observe_count(10), None);
    assert_eq!(session.state(), ScanSessionState::Configuring);
}

#[test]
fn deadline_fires_exactly_once() {
    let mut session = awaiting_session(1);
    assert!(session.deadline_elapsed());
    assert_eq!(session.state(), ScanSessionState::TimedOut);
    // A late tick after the transition does nothing.
    assert!(!session.deadline_elapsed());
    assert_eq!(session.state(), ScanSessionState::TimedOut);
}

#[test]
fn deadline_after_completion_does_nothing() {
    let mut session = awaiting_session(1);
    assert_eq!(session.observe_count(2), Some(1));
    assert!(!session.deadline_elapsed());
    assert_eq!(session.state(), ScanSessionState::Completed);
}

#[test]
fn cancel_only_works_while_scanning_or_awaiting() {
    let mut session = ScanSession::new();
    assert!(!session.cancel());
    assert_eq!(session.state(), ScanSessionState::Idle);

    session.begin().unwrap();
    assert!(!session.cancel());

    assert!(session.configured());
    assert!(session.cancel());
    assert_eq!(session.state(), ScanSessionState::Cancelled);

    // Terminal: cancelling again is a no-op.
    assert!(!session.cancel());
    assert_eq!(session.state(), ScanSessionState::Cancelled);

    let mut session = awaiting_session(0);
    assert!(session.cancel());
    assert_eq!(session.state(), ScanSessionState::Cancelled);
}

#[test]
fn fail_aborts_active_states_and_reset_recovers() {
    let mut session = ScanSession::new();
    session.begin().unwrap();
    assert!(session.fail());
    assert_eq!(session.state(), ScanSessionState::Failed);
    assert!(session.reset());
    assert_eq!(session.state(), ScanSessionState::Idle);

    // fail is a no-op outside active states.
    assert!(!session.fail());
    assert_eq!(session.state(), ScanSessionState::Idle);
}

#[test]
fn reset_is_a_no_op_outside_terminal_states() {
    let mut session = ScanSession::new();
    assert!(!session.reset());

    session.begin().unwrap();
    assert!(!session.reset());
    assert_eq!(session.state(), ScanSessionState::Configuring);
}

#[test]
fn transition_methods_gate_on_current_state() {
    let mut session = ScanSession::new();
    assert!(!session.configured());
    assert!(!session.accepted(0));
    assert_eq!(session.state(), ScanSessionState::Idle);

    session.begin().unwrap();
    assert!(!session.accepted(0));
    assert_eq!(session.state(), ScanSessionState::Configuring);
}

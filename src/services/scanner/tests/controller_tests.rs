use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::AppConfig;
use crate::services::inventory::{PollCadence, SnapshotStore};
use crate::test_utils::{attached_file, init_test_logging, FakeHelper, RecordingNotifier};
use crate::types::{ScanOutcome, ScanSessionState, ServiceError};

use super::*;

struct Rig {
    helper: Arc<FakeHelper>,
    notifier: Arc<RecordingNotifier>,
    store: SnapshotStore,
    cadence: PollCadence,
    counts_tx: watch::Sender<usize>,
    controller: ScanSessionController<FakeHelper>,
}

fn rig_with(helper: FakeHelper, initial_files: usize) -> Rig {
    init_test_logging();
    let helper = Arc::new(helper);
    let notifier = Arc::new(RecordingNotifier::confirming());
    let store = SnapshotStore::new();
    store.replace(
        (0..initial_files)
            .map(|i| attached_file(&format!("f{i}"), i as i64))
            .collect(),
    );
    let cadence = PollCadence::new(Duration::from_secs(3), Duration::from_millis(1500));
    let (counts_tx, counts_rx) = watch::channel(initial_files);
    let config = AppConfig::default();
    let controller = ScanSessionController::new(
        Arc::clone(&helper),
        store.clone(),
        cadence.clone(),
        counts_rx,
        notifier.clone() as Arc<dyn crate::services::notify::Notifier>,
        &config,
        "bearer-token",
    );
    Rig {
        helper,
        notifier,
        store,
        cadence,
        counts_tx,
        controller,
    }
}

#[tokio::test]
async fn start_is_refused_when_helper_is_offline() {
    let mut rig = rig_with(FakeHelper::offline(), 0);
    let err = rig.controller.start_scan("doc-1", "cls-1").await.unwrap_err();
    assert!(matches!(err, ServiceError::Connectivity(_)));
    assert_eq!(rig.controller.state(), ScanSessionState::Idle);
    assert_eq!(rig.helper.calls(), vec!["ping"]);
    assert_eq!(
        rig.notifier.messages_of("error"),
        vec![MSG_SCANNER_NOT_DETECTED.to_string()]
    );
}

#[tokio::test]
async fn start_is_refused_without_a_detected_device() {
    let mut rig = rig_with(FakeHelper::without_device(), 0);
    let err = rig.controller.start_scan("doc-1", "cls-1").await.unwrap_err();
    assert!(matches!(err, ServiceError::Connectivity(_)));
    assert_eq!(rig.controller.state(), ScanSessionState::Idle);
    // Aliveness and device checks ran; no configuration was pushed.
    assert_eq!(rig.helper.calls(), vec!["ping", "device"]);
}

#[tokio::test]
async fn start_requires_both_identifiers() {
    let mut rig = rig_with(FakeHelper::ready(), 0);
    let err = rig.controller.start_scan("", "cls-1").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    let err = rig.controller.start_scan("doc-1", "  ").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    // Rejected before any helper traffic.
    assert!(rig.helper.calls().is_empty());
}

#[tokio::test]
async fn failed_config_push_returns_to_idle_without_timers() {
    let helper = FakeHelper::ready();
    helper
        .refuse_document
        .store(true, std::sync::atomic::Ordering::Relaxed);
    let mut rig = rig_with(helper, 2);

    let err = rig.controller.start_scan("doc-1", "cls-1").await.unwrap_err();
    assert!(matches!(err, ServiceError::Connectivity(_)));
    assert_eq!(rig.controller.state(), ScanSessionState::Idle);
    // Poller cadence was never bumped.
    assert!(!rig.cadence.is_active());
    // The second push failed, so the scan was never started.
    assert_eq!(rig.helper.calls(), vec!["ping", "device", "target", "document"]);
    assert_eq!(rig.notifier.messages_of("error").len(), 1);
}

#[tokio::test]
async fn rejected_scan_returns_to_idle_with_the_helper_message() {
    let helper = FakeHelper::ready();
    helper
        .reject_scan
        .store(true, std::sync::atomic::Ordering::Relaxed);
    let mut rig = rig_with(helper, 0);

    let err = rig.controller.start_scan("doc-1", "cls-1").await.unwrap_err();
    assert!(matches!(err, ServiceError::Remote { status: 409, .. }));
    assert_eq!(rig.controller.state(), ScanSessionState::Idle);
    let errors = rig.notifier.messages_of("error");
    assert!(errors[0].contains("scanner busy"), "got: {errors:?}");
}

#[tokio::test]
async fn accepted_scan_awaits_files_at_active_cadence() {
    let mut rig = rig_with(FakeHelper::ready(), 3);
    rig.controller.start_scan("doc-9", "cls-4").await.unwrap();

    assert_eq!(rig.controller.state(), ScanSessionState::AwaitingFiles);
    assert_eq!(rig.controller.session().files_count_at_start(), 3);
    assert!(rig.cadence.is_active());

    // The helper got the backend URL and the document tuple, in order.
    assert_eq!(
        rig.helper.calls(),
        vec!["ping", "device", "target", "document", "start"]
    );
    let target = rig.helper.last_target.lock().unwrap().clone().unwrap();
    assert_eq!(target.document_id, "doc-9");
    assert_eq!(target.classeur_id, "cls-4");
    assert_eq!(target.token, "bearer-token");
}

#[tokio::test]
async fn second_start_while_awaiting_is_a_no_op() {
    let mut rig = rig_with(FakeHelper::ready(), 0);
    rig.controller.start_scan("doc-1", "cls-1").await.unwrap();
    let calls_before = rig.helper.calls().len();

    let err = rig.controller.start_scan("doc-1", "cls-1").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(rig.controller.state(), ScanSessionState::AwaitingFiles);
    assert_eq!(rig.helper.calls().len(), calls_before);
}

#[tokio::test(start_paused = true)]
async fn count_increase_completes_the_session() {
    let mut rig = rig_with(FakeHelper::ready(), 3);
    rig.controller.start_scan("doc-1", "cls-1").await.unwrap();

    let counts_tx = rig.counts_tx.clone();
    let feed = async move {
        tokio::time::sleep(Duration::from_secs(4)).await;
        counts_tx.send_replace(3); // flat: not a completion signal
        tokio::time::sleep(Duration::from_secs(2)).await;
        counts_tx.send_replace(5);
    };

    let (outcome, _) = tokio::join!(rig.controller.await_completion(), feed);
    assert_eq!(outcome.unwrap(), ScanOutcome::Completed { files_added: 2 });
    assert_eq!(rig.controller.state(), ScanSessionState::Idle);
    assert!(!rig.cadence.is_active());
    assert_eq!(
        rig.notifier.messages_of("success"),
        vec!["2 file(s) added".to_string()]
    );

    // A late deadline tick after completion changes nothing.
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(rig.controller.state(), ScanSessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn deadline_times_the_session_out() {
    let mut rig = rig_with(FakeHelper::ready(), 1);
    rig.controller.start_scan("doc-1", "cls-1").await.unwrap();

    let started = tokio::time::Instant::now();
    let outcome = rig.controller.await_completion().await.unwrap();
    assert_eq!(outcome, ScanOutcome::TimedOut);
    assert!(started.elapsed() >= Duration::from_secs(180));
    assert_eq!(rig.controller.state(), ScanSessionState::Idle);
    assert!(!rig.cadence.is_active());
    assert_eq!(
        rig.notifier.messages_of("error"),
        vec![MSG_SCAN_TIMED_OUT.to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn confirmed_cancel_resolves_the_session() {
    let mut rig = rig_with(FakeHelper::ready(), 0);
    rig.controller.start_scan("doc-1", "cls-1").await.unwrap();

    let handle = rig.controller.cancel_handle();
    let cancel = async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(handle.request());
    };

    let (outcome, _) = tokio::join!(rig.controller.await_completion(), cancel);
    assert_eq!(outcome.unwrap(), ScanOutcome::Cancelled);
    assert_eq!(rig.controller.state(), ScanSessionState::Idle);
    assert!(!rig.cadence.is_active());
    assert_eq!(
        rig.notifier.messages_of("info"),
        vec![MSG_SCAN_CANCELLED.to_string()]
    );
    assert_eq!(
        rig.notifier.messages_of("confirm"),
        vec![MSG_CONFIRM_CANCEL.to_string()]
    );
}

#[tokio::test]
async fn declined_confirmation_keeps_the_session_running() {
    let mut rig = rig_with(FakeHelper::ready(), 0);
    rig.controller.start_scan("doc-1", "cls-1").await.unwrap();

    rig.notifier
        .confirm_answer
        .store(false, std::sync::atomic::Ordering::Relaxed);
    let handle = rig.controller.cancel_handle();
    assert!(!handle.request());
    assert_eq!(rig.controller.state(), ScanSessionState::AwaitingFiles);
    assert!(rig.cadence.is_active());
}

#[tokio::test]
async fn await_completion_requires_an_awaiting_session() {
    let mut rig = rig_with(FakeHelper::ready(), 0);
    let err = rig.controller.await_completion().await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test(start_paused = true)]
async fn snapshot_writes_alone_do_not_complete_a_session() {
    // Uploads mutate the snapshot directly, but completion listens only to
    // counts published by the poller.
    let mut rig = rig_with(FakeHelper::ready(), 1);
    rig.controller.start_scan("doc-1", "cls-1").await.unwrap();

    let store = rig.store.clone();
    let feed = async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        store.prepend(vec![attached_file("manual-upload", 60)]);
    };

    let (outcome, _) = tokio::join!(rig.controller.await_completion(), feed);
    // Nothing was ever published on the counts channel, so the safety
    // deadline is what resolves the session.
    assert_eq!(outcome.unwrap(), ScanOutcome::TimedOut);
}

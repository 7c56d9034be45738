use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::test_utils::{init_test_logging, FakeHelper};

use super::*;

#[tokio::test]
async fn offline_helper_probes_as_unreachable() {
    let prober = ConnectionProber::new(Arc::new(FakeHelper::offline()));
    let status = prober.probe().await;
    assert!(!status.server_reachable);
    assert!(!status.device_detected);
    assert!(status.last_error.is_some());
    assert!(!status.ready());
}

#[tokio::test]
async fn reachable_helper_without_device_is_not_ready() {
    let prober = ConnectionProber::new(Arc::new(FakeHelper::without_device()));
    let status = prober.probe().await;
    assert!(status.server_reachable);
    assert!(!status.device_detected);
    assert_eq!(
        status.last_error.as_deref(),
        Some("no scanner device detected")
    );
}

#[tokio::test]
async fn ready_helper_probes_clean() {
    let prober = ConnectionProber::new(Arc::new(FakeHelper::ready()));
    let status = prober.probe().await;
    assert!(status.ready());
    assert!(status.last_error.is_none());
}

#[tokio::test]
async fn device_check_is_skipped_when_helper_is_down() {
    let helper = Arc::new(FakeHelper::offline());
    let prober = ConnectionProber::new(Arc::clone(&helper));
    prober.probe().await;
    assert_eq!(helper.calls(), vec!["ping"]);
}

#[tokio::test(start_paused = true)]
async fn monitor_publishes_periodically_and_stops_on_cancel() {
    init_test_logging();
    let helper = Arc::new(FakeHelper::ready());
    let token = CancellationToken::new();
    let monitor = ConnectionProber::new(Arc::clone(&helper))
        .spawn_monitor(Duration::from_secs(10), token.clone());

    // Before the first tick the channel still holds the neutral default.
    assert!(!monitor.current().server_reachable);

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert!(monitor.current().ready());
    let pings_before = helper.calls().iter().filter(|c| *c == "ping").count();
    assert!(pings_before >= 2, "expected at least two probes");

    token.cancel();
    tokio::time::sleep(Duration::from_secs(60)).await;
    let pings_after = helper.calls().iter().filter(|c| *c == "ping").count();
    assert_eq!(pings_before, pings_after);
    // The last published status stays readable after teardown.
    assert!(monitor.current().ready());
}

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::types::ScannerConnectionStatus;

use super::helper::ScannerHelper;

/// Reachability/readiness checks against the scanner helper.
///
/// `probe` never fails: every network error, timeout, or refusal resolves
/// to a status object with `server_reachable = false` and the error string
/// attached. The distinction is deliberately coarse; the helper process is
/// outside this system's control.
pub struct ConnectionProber<H: ScannerHelper> {
    helper: Arc<H>,
}

impl<H: ScannerHelper> Clone for ConnectionProber<H> {
    fn clone(&self) -> Self {
        Self {
            helper: Arc::clone(&self.helper),
        }
    }
}

impl<H: ScannerHelper> ConnectionProber<H> {
    pub fn new(helper: Arc<H>) -> Self {
        Self { helper }
    }

    /// Two independent checks: aliveness first, then (only if alive)
    /// device presence.
    pub async fn probe(&self) -> ScannerConnectionStatus {
        if let Err(e) = self.helper.ping().await {
            debug!("Scanner helper unreachable: {e}");
            return ScannerConnectionStatus::unreachable(e.to_string());
        }

        match self.helper.device_status().await {
            Ok(device) => ScannerConnectionStatus {
                server_reachable: true,
                device_detected: device.detected,
                last_error: (!device.detected).then(|| "no scanner device detected".to_string()),
                checked_at: Utc::now(),
            },
            Err(e) => {
                debug!("Device check failed: {e}");
                ScannerConnectionStatus {
                    server_reachable: true,
                    device_detected: false,
                    last_error: Some(e.to_string()),
                    checked_at: Utc::now(),
                }
            }
        }
    }

    /// Passive monitoring: probe on a fixed interval and publish the latest
    /// status. The task stops when `token` is cancelled; the final status
    /// stays readable on the channel.
    pub fn spawn_monitor(self, interval: Duration, token: CancellationToken) -> ProbeMonitor {
        let (tx, rx) = watch::channel(ScannerConnectionStatus::default());
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let status = tokio::select! {
                    _ = token.cancelled() => break,
                    status = self.probe() => status,
                };
                if !status.server_reachable {
                    warn!(
                        "Scanner helper offline: {}",
                        status.last_error.as_deref().unwrap_or("unknown")
                    );
                }
                tx.send_replace(status);
            }
            debug!("Connection monitor stopped");
        });
        ProbeMonitor { status: rx, task }
    }
}

/// Handle on a running probe loop.
pub struct ProbeMonitor {
    status: watch::Receiver<ScannerConnectionStatus>,
    task: JoinHandle<()>,
}

impl ProbeMonitor {
    /// Latest published status.
    pub fn current(&self) -> ScannerConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScannerConnectionStatus> {
        self.status.clone()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "tests/prober_tests.rs"]
mod tests;

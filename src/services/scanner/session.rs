//! Scan session workflow.
//!
//! A session is driven by two independently polled systems: the scanner
//! helper (which only ever acknowledges "scan accepted") and the backend
//! file inventory. The helper has no push mechanism, so the authoritative
//! completion signal is the inventory observing a file-count increase,
//! never a callback from the scan API.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::services::inventory::{PollCadence, SnapshotStore};
use crate::services::notify::Notifier;
use crate::types::{ScanOutcome, ScanSessionState, ScanTarget, ServiceError, ServiceResult};

use super::helper::ScannerHelper;
use super::prober::ConnectionProber;

pub const MSG_SCANNER_NOT_DETECTED: &str =
    "No scanner detected. Start the scanner application, check the device, and try again.";
pub const MSG_SCAN_TIMED_OUT: &str =
    "No scanned file arrived in time. Check the scanner application and try again.";
pub const MSG_SCAN_CANCELLED: &str = "Scan cancelled.";
pub const MSG_CONFIRM_CANCEL: &str = "Cancel the scan in progress?";

/// One scan attempt, as a pure state machine.
///
/// Every transition is gated on the current state, so late timer fires or
/// stale poll results are dropped instead of corrupting the session. The
/// async side effects (helper calls, timers, cadence switching) live in
/// [`ScanSessionController`].
#[derive(Debug, Default)]
pub struct ScanSession {
    id: Option<Uuid>,
    state: ScanSessionState,
    started_at: Option<DateTime<Utc>>,
    files_count_at_start: usize,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanSessionState {
        self.state
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn files_count_at_start(&self) -> usize {
        self.files_count_at_start
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// `Idle -> Configuring`. Rejected, with state unchanged, while another
    /// attempt is anywhere between `Configuring` and `AwaitingFiles`.
    pub fn begin(&mut self) -> ServiceResult<()> {
        if self.state != ScanSessionState::Idle {
            return Err(ServiceError::Validation(
                "a scan is already in progress".to_string(),
            ));
        }
        self.id = Some(Uuid::new_v4());
        self.started_at = Some(Utc::now());
        self.state = ScanSessionState::Configuring;
        Ok(())
    }

    /// `Configuring -> Scanning`, once both config pushes landed.
    pub fn configured(&mut self) -> bool {
        if self.state != ScanSessionState::Configuring {
            return false;
        }
        self.state = ScanSessionState::Scanning;
        true
    }

    /// `Scanning -> AwaitingFiles`. Records the file count the completion
    /// check will be measured against.
    pub fn accepted(&mut self, files_count_at_start: usize) -> bool {
        if self.state != ScanSessionState::Scanning {
            return false;
        }
        self.files_count_at_start = files_count_at_start;
        self.state = ScanSessionState::AwaitingFiles;
        true
    }

    /// Completion check: a count strictly above the starting count while
    /// `AwaitingFiles` completes the session and yields the delta.
    pub fn observe_count(&mut self, current_count: usize) -> Option<usize> {
        if self.state != ScanSessionState::AwaitingFiles
            || current_count <= self.files_count_at_start
        {
            return None;
        }
        self.state = ScanSessionState::Completed;
        Some(current_count - self.files_count_at_start)
    }

    /// Safety deadline fired. True only on the first fire while
    /// `AwaitingFiles`; a late tick after any transition does nothing.
    pub fn deadline_elapsed(&mut self) -> bool {
        if self.state != ScanSessionState::AwaitingFiles {
            return false;
        }
        self.state = ScanSessionState::TimedOut;
        true
    }

    /// User cancellation. A no-op in `Idle`, `Configuring`, and terminal
    /// states.
    pub fn cancel(&mut self) -> bool {
        if !matches!(
            self.state,
            ScanSessionState::Scanning | ScanSessionState::AwaitingFiles
        ) {
            return false;
        }
        self.state = ScanSessionState::Cancelled;
        true
    }

    /// Abort a pending attempt (config push refused, scan rejected).
    pub fn fail(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state = ScanSessionState::Failed;
        true
    }

    /// Collapse a terminal state back to `Idle`, making the machine
    /// reusable for the next attempt. Sessions are never retried
    /// automatically.
    pub fn reset(&mut self) -> bool {
        if !self.state.is_terminal() {
            return false;
        }
        self.state = ScanSessionState::Idle;
        true
    }
}

/// Cancels the session it was issued for, after user confirmation.
///
/// Cancelling does not abort in-flight helper requests or hardware
/// scanning; it only stops the local timers and prevents late results from
/// being acted on.
#[derive(Clone)]
pub struct ScanCancelHandle {
    token: CancellationToken,
    notifier: Arc<dyn Notifier>,
}

impl ScanCancelHandle {
    pub fn request(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        if !self.notifier.confirm(MSG_CONFIRM_CANCEL) {
            return false;
        }
        self.token.cancel();
        true
    }
}

/// Async driver for [`ScanSession`].
///
/// Owns exactly one session at a time. Communicates with the inventory
/// poller only through the shared snapshot and its published counts, so
/// both sides stay testable in isolation.
pub struct ScanSessionController<H: ScannerHelper> {
    helper: Arc<H>,
    prober: ConnectionProber<H>,
    snapshot: SnapshotStore,
    cadence: PollCadence,
    counts: watch::Receiver<usize>,
    notifier: Arc<dyn Notifier>,
    backend_base_url: String,
    token: String,
    deadline: Duration,
    session: ScanSession,
    cancel: CancellationToken,
}

impl<H: ScannerHelper> ScanSessionController<H> {
    pub fn new(
        helper: Arc<H>,
        snapshot: SnapshotStore,
        cadence: PollCadence,
        counts: watch::Receiver<usize>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
        token: impl Into<String>,
    ) -> Self {
        Self {
            prober: ConnectionProber::new(Arc::clone(&helper)),
            helper,
            snapshot,
            cadence,
            counts,
            notifier,
            backend_base_url: config.backend_base_url.clone(),
            token: token.into(),
            deadline: config.scan_deadline,
            session: ScanSession::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> ScanSessionState {
        self.session.state()
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Handle the UI keeps to cancel the currently running session.
    /// Handles issued for finished sessions go stale and do nothing.
    pub fn cancel_handle(&self) -> ScanCancelHandle {
        ScanCancelHandle {
            token: self.cancel.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }

    /// Configure the helper and start a scan.
    ///
    /// Preconditions: no active session, non-empty identifiers, and a fresh
    /// probe reporting a detected device. On success the session is in
    /// `AwaitingFiles`, the poller runs at its active cadence, and
    /// [`Self::await_completion`] will resolve the attempt.
    pub async fn start_scan(&mut self, document_id: &str, classeur_id: &str) -> ServiceResult<()> {
        if self.session.is_active() {
            return Err(ServiceError::Validation(
                "a scan is already in progress".to_string(),
            ));
        }
        if document_id.trim().is_empty() || classeur_id.trim().is_empty() {
            return Err(ServiceError::Validation(
                "document and classeur identifiers are required".to_string(),
            ));
        }

        let status = self.prober.probe().await;
        if !status.ready() {
            self.notifier.error(MSG_SCANNER_NOT_DETECTED);
            return Err(ServiceError::Connectivity(
                status
                    .last_error
                    .unwrap_or_else(|| "scanner not ready".to_string()),
            ));
        }

        self.session.begin()?;

        if let Err(e) = self.helper.set_target_url(&self.backend_base_url).await {
            return self.abort_start(e);
        }
        let target = ScanTarget {
            document_id: document_id.to_string(),
            classeur_id: classeur_id.to_string(),
            token: self.token.clone(),
        };
        if let Err(e) = self.helper.set_document(&target).await {
            return self.abort_start(e);
        }

        self.session.configured();
        if let Err(e) = self.helper.start_scan().await {
            return self.abort_start(e);
        }

        let files_count_at_start = self.snapshot.file_count();
        self.session.accepted(files_count_at_start);
        self.cadence.set_active();
        self.cancel = CancellationToken::new();
        info!(
            "Scan {} accepted for document {document_id} (files at start: {files_count_at_start})",
            self.session.id().map(|id| id.to_string()).unwrap_or_default()
        );
        Ok(())
    }

    /// Wait for the attempt started by [`Self::start_scan`] to resolve,
    /// whichever comes first of new files observed, the safety deadline,
    /// and user cancellation. Always restores the idle poll cadence and
    /// leaves the session `Idle`.
    pub async fn await_completion(&mut self) -> ServiceResult<ScanOutcome> {
        if self.session.state() != ScanSessionState::AwaitingFiles {
            return Err(ServiceError::Validation(
                "no scan is awaiting files".to_string(),
            ));
        }

        let deadline = tokio::time::Instant::now() + self.deadline;
        let cancel = self.cancel.clone();
        let mut counts = self.counts.clone();
        let mut counts_alive = true;
        let mut deadline_armed = true;
        let mut cancel_armed = true;

        let outcome = loop {
            tokio::select! {
                _ = cancel.cancelled(), if cancel_armed => {
                    cancel_armed = false;
                    if self.session.cancel() {
                        break ScanOutcome::Cancelled;
                    }
                }
                _ = tokio::time::sleep_until(deadline), if deadline_armed => {
                    deadline_armed = false;
                    if self.session.deadline_elapsed() {
                        break ScanOutcome::TimedOut;
                    }
                }
                changed = counts.changed(), if counts_alive => {
                    match changed {
                        Ok(()) => {
                            let current = *counts.borrow_and_update();
                            if let Some(files_added) = self.session.observe_count(current) {
                                break ScanOutcome::Completed { files_added };
                            }
                        }
                        Err(_) => {
                            warn!("Inventory poller stopped while a scan was awaiting files");
                            counts_alive = false;
                        }
                    }
                }
            }
        };

        self.cadence.set_idle();
        match &outcome {
            ScanOutcome::Completed { files_added } => {
                info!("Scan completed, {files_added} new file(s) observed");
                self.notifier
                    .success(&format!("{files_added} file(s) added"));
            }
            ScanOutcome::Cancelled => self.notifier.info(MSG_SCAN_CANCELLED),
            ScanOutcome::TimedOut => self.notifier.error(MSG_SCAN_TIMED_OUT),
        }
        self.session.reset();
        Ok(outcome)
    }

    fn abort_start(&mut self, error: ServiceError) -> ServiceResult<()> {
        warn!("Scan start aborted: {error}");
        self.session.fail();
        self.session.reset();
        self.notifier.error(&error.to_string());
        Err(error)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod session_tests;

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;

//! Top-level bootstrap.
//!
//! Owns the configuration, the authenticated clients, and the shutdown
//! token every periodic task is scoped to. Nothing here is ambient: the
//! embedding application builds one `AppContext` and passes services down
//! from it.

use std::sync::Arc;

use anyhow::Context as _;
use log::info;
use tokio_util::sync::CancellationToken;

use crate::config::session::{AuthSession, SessionStore};
use crate::config::AppConfig;
use crate::services::backend::BackendClient;
use crate::services::inventory::{InventoryHandle, InventoryPoller, PollCadence, SnapshotStore};
use crate::services::notify::Notifier;
use crate::services::scanner::{ConnectionProber, HelperClient, ProbeMonitor, ScanSessionController};
use crate::services::upload::UploadSubmitter;

pub struct AppContext {
    config: AppConfig,
    session: AuthSession,
    backend: Arc<BackendClient>,
    helper: Arc<HelperClient>,
    snapshot: SnapshotStore,
    shutdown: CancellationToken,
}

impl AppContext {
    /// Wire configuration and the stored login session into ready clients.
    pub fn bootstrap(config: AppConfig) -> anyhow::Result<Self> {
        let session = SessionStore::new(&config.session_file)
            .load()
            .context("loading login session")?;
        Self::with_session(config, session)
    }

    /// Bootstrap with an already-loaded session (tests, embedded hosts).
    pub fn with_session(config: AppConfig, session: AuthSession) -> anyhow::Result<Self> {
        let backend = BackendClient::new(&config.backend_base_url, &session.token, config.http_timeout)
            .context("building backend client")?;
        let helper = HelperClient::new(&config.scanner_base_url(), config.probe_timeout)
            .context("building scanner helper client")?;
        info!("Bootstrapped against {}", config.backend_base_url);
        Ok(Self {
            config,
            session,
            backend: Arc::new(backend),
            helper: Arc::new(helper),
            snapshot: SnapshotStore::new(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> Arc<BackendClient> {
        Arc::clone(&self.backend)
    }

    pub fn snapshot(&self) -> SnapshotStore {
        self.snapshot.clone()
    }

    /// Token all periodic tasks are scoped to. Cancelling it (or dropping
    /// the context) releases every timer and loop deterministically.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// One-shot probe of the scanner helper.
    pub fn prober(&self) -> ConnectionProber<HelperClient> {
        ConnectionProber::new(Arc::clone(&self.helper))
    }

    /// Passive scanner monitoring at the configured interval.
    pub fn spawn_probe_monitor(&self) -> ProbeMonitor {
        self.prober()
            .spawn_monitor(self.config.probe_interval, self.shutdown.child_token())
    }

    /// Start polling one document's file inventory. The handle owns the
    /// loop; dropping it (or shutting the context down) stops polling.
    pub fn spawn_inventory(&self, document_id: &str) -> InventoryHandle {
        let cadence = PollCadence::new(
            self.config.poll_idle_interval,
            self.config.poll_active_interval,
        );
        InventoryPoller::new(self.backend(), self.snapshot(), document_id)
            .spawn(cadence, self.shutdown.child_token())
    }

    /// Scan workflow driver wired to a running inventory poller.
    pub fn scan_controller(
        &self,
        inventory: &InventoryHandle,
        notifier: Arc<dyn Notifier>,
    ) -> ScanSessionController<HelperClient> {
        ScanSessionController::new(
            Arc::clone(&self.helper),
            self.snapshot(),
            inventory.cadence(),
            inventory.subscribe_counts(),
            notifier,
            &self.config,
            self.session.token.clone(),
        )
    }

    /// Manual upload/delete/preview path.
    pub fn upload_submitter(&self) -> UploadSubmitter<BackendClient> {
        UploadSubmitter::new(
            self.backend(),
            self.snapshot(),
            self.config.accepted_upload_mime.clone(),
        )
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

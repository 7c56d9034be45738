use std::sync::Arc;

use log::{debug, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::services::backend::FileBackend;
use crate::types::ServiceResult;

use super::{PollCadence, SnapshotStore};

/// Periodic read-through refresh of one document's file inventory.
///
/// Each successful poll replaces the snapshot wholesale and publishes the
/// resulting count. A failed poll is swallowed and retried on the next
/// tick: stale-but-present data beats flicker.
pub struct InventoryPoller<B: FileBackend> {
    backend: Arc<B>,
    store: SnapshotStore,
    document_id: String,
    counts: watch::Sender<usize>,
}

impl<B: FileBackend> InventoryPoller<B> {
    pub fn new(backend: Arc<B>, store: SnapshotStore, document_id: impl Into<String>) -> Self {
        let counts = watch::Sender::new(store.file_count());
        Self {
            backend,
            store,
            document_id: document_id.into(),
            counts,
        }
    }

    /// One poll: fetch the authoritative listing, replace the snapshot,
    /// publish the new count, and return the count delta.
    pub async fn refresh(&self) -> ServiceResult<i64> {
        let files = self.backend.list_files(&self.document_id).await?;
        let delta = self.store.replace(files);
        self.counts.send_replace(self.store.file_count());
        Ok(delta)
    }

    /// Run the poll loop until `token` is cancelled. The cadence handle
    /// stays shared: the scan session controller speeds polling up while a
    /// session awaits files and restores it afterwards.
    pub fn spawn(self, cadence: PollCadence, token: CancellationToken) -> InventoryHandle {
        let counts = self.counts.subscribe();
        let cadence_for_task = cadence.clone();
        let loop_token = token.clone();
        let document_id = self.document_id.clone();
        let task = tokio::spawn(async move {
            info!("Inventory poller started for document {document_id}");
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(cadence_for_task.current()) => {}
                }
                // Racing the refresh against cancellation keeps a torn-down
                // poller from applying a stale response to the snapshot.
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    refreshed = self.refresh() => {
                        if let Err(e) = refreshed {
                            debug!("Inventory poll failed, keeping stale snapshot: {e}");
                        }
                    }
                }
            }
            info!("Inventory poller stopped for document {document_id}");
        });

        InventoryHandle {
            counts,
            cadence,
            token,
            task,
        }
    }
}

/// Handle on a running inventory poll loop. Dropping it stops the loop.
pub struct InventoryHandle {
    counts: watch::Receiver<usize>,
    cadence: PollCadence,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl InventoryHandle {
    /// Latest published file count.
    pub fn current_count(&self) -> usize {
        *self.counts.borrow()
    }

    pub fn subscribe_counts(&self) -> watch::Receiver<usize> {
        self.counts.clone()
    }

    pub fn cadence(&self) -> PollCadence {
        self.cadence.clone()
    }

    /// Deterministic teardown: the loop observes the cancellation on its
    /// next select point and exits without applying further results.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for InventoryHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;

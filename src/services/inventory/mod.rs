//! Local file inventory: the shared snapshot and its polling loop.
//!
//! The snapshot is the only state the scan workflow and the upload paths
//! share. It has exactly three producers: the poller (full replace), the
//! upload submitter (prepend), and the delete handler (remove by id).
//! Last-write-wins is acceptable for this read-mostly display list.

pub mod poller;

pub use poller::{InventoryHandle, InventoryPoller};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::types::{AttachedFile, FileSnapshot};

/// Shared, cloneable handle on the current file snapshot.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<FileSnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> FileSnapshot {
        self.inner.read().expect("snapshot lock poisoned").clone()
    }

    pub fn file_count(&self) -> usize {
        self.inner.read().expect("snapshot lock poisoned").len()
    }

    /// Full replacement with a fresh authoritative listing. Returns the
    /// count delta against the previous snapshot.
    pub fn replace(&self, files: Vec<AttachedFile>) -> i64 {
        let mut guard = self.inner.write().expect("snapshot lock poisoned");
        let old_count = guard.len() as i64;
        *guard = FileSnapshot::new(files);
        guard.len() as i64 - old_count
    }

    /// Optimistic prepend of freshly uploaded descriptors.
    pub fn prepend(&self, files: Vec<AttachedFile>) {
        self.inner
            .write()
            .expect("snapshot lock poisoned")
            .prepend(files);
    }

    /// Optimistic removal after a confirmed server-side delete.
    pub fn remove(&self, file_id: &str) -> bool {
        self.inner
            .write()
            .expect("snapshot lock poisoned")
            .remove(file_id)
    }
}

/// Runtime-switchable poll interval, shared between the poller task and the
/// scan session controller.
#[derive(Clone)]
pub struct PollCadence {
    idle: Duration,
    active: Duration,
    current_ms: Arc<AtomicU64>,
}

impl PollCadence {
    pub fn new(idle: Duration, active: Duration) -> Self {
        Self {
            current_ms: Arc::new(AtomicU64::new(idle.as_millis() as u64)),
            idle,
            active,
        }
    }

    /// Faster polling for the duration of a scan session.
    pub fn set_active(&self) {
        self.current_ms
            .store(self.active.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn set_idle(&self) {
        self.current_ms
            .store(self.idle.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn current(&self) -> Duration {
        Duration::from_millis(self.current_ms.load(Ordering::Relaxed))
    }

    pub fn is_active(&self) -> bool {
        self.current() == self.active
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a file descriptor in the local snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOrigin {
    /// Present on the server before this client looked.
    #[default]
    Existing,
    /// Added through the manual picker / drag-drop path.
    Uploaded,
    /// Arrived during a scan session window.
    Scanned,
}

/// One file attached to a document, mirroring the backend record.
///
/// Wire fields follow the backend listing: `{id, name, size, type, created_at}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedFile {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub origin: FileOrigin,
}

/// A file picked locally (drag-drop or manual selection), not yet submitted.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Locally cached list of file descriptors for one document.
///
/// Ordered by creation time descending. Refreshed by full replacement, never
/// merged; comparison across refreshes is by count (files are assumed
/// append-only during a scan window).
#[derive(Debug, Clone, Default)]
pub struct FileSnapshot {
    files: Vec<AttachedFile>,
}

impl FileSnapshot {
    pub fn new(mut files: Vec<AttachedFile>) -> Self {
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { files }
    }

    pub fn files(&self) -> &[AttachedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.files.iter().any(|f| f.id == file_id)
    }

    /// Optimistically place freshly created descriptors at the front,
    /// independent of the next poll.
    pub fn prepend(&mut self, files: Vec<AttachedFile>) {
        self.files.splice(0..0, files);
    }

    /// Remove a descriptor by id after a confirmed server-side delete.
    pub fn remove(&mut self, file_id: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.id != file_id);
        self.files.len() != before
    }
}

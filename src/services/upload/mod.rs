//! Manual upload path: picker / drag-drop files submitted to the backend.
//!
//! Independent of the scan workflow; both terminate in the same file
//! snapshot.

use std::sync::Arc;

use log::{info, warn};

use crate::services::backend::FileBackend;
use crate::services::inventory::SnapshotStore;
use crate::types::{AttachedFile, FileOrigin, LocalFile, ServiceError, ServiceResult};

/// Split picked files into (accepted, rejected) by MIME type.
pub fn partition_supported<'a>(
    files: &'a [LocalFile],
    accepted_mime: &str,
) -> (Vec<&'a LocalFile>, Vec<&'a LocalFile>) {
    files
        .iter()
        .partition(|f| f.mime_type.eq_ignore_ascii_case(accepted_mime))
}

/// Packages local files into a multipart submission and mirrors the result
/// into the shared snapshot.
pub struct UploadSubmitter<B: FileBackend> {
    backend: Arc<B>,
    store: SnapshotStore,
    accepted_mime: String,
}

impl<B: FileBackend> UploadSubmitter<B> {
    pub fn new(backend: Arc<B>, store: SnapshotStore, accepted_mime: impl Into<String>) -> Self {
        Self {
            backend,
            store,
            accepted_mime: accepted_mime.into(),
        }
    }

    /// Submit the accepted subset of `files` for `document_id`.
    ///
    /// With no acceptable file in the input this fails as a validation
    /// error before any network call. On success the created descriptors
    /// are prepended to the snapshot without waiting for the next poll.
    pub async fn submit(
        &self,
        files: Vec<LocalFile>,
        document_id: &str,
        classeur_id: &str,
    ) -> ServiceResult<Vec<AttachedFile>> {
        if document_id.trim().is_empty() || classeur_id.trim().is_empty() {
            return Err(ServiceError::Validation(
                "document and classeur identifiers are required".to_string(),
            ));
        }

        let (accepted, rejected) = partition_supported(&files, &self.accepted_mime);
        if !rejected.is_empty() {
            warn!(
                "Ignoring {} file(s) with unsupported type: {}",
                rejected.len(),
                rejected
                    .iter()
                    .map(|f| f.file_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if accepted.is_empty() {
            return Err(ServiceError::Validation(format!(
                "only {} files can be attached",
                self.accepted_mime
            )));
        }

        let accepted: Vec<LocalFile> = accepted.into_iter().cloned().collect();
        let mut created = self
            .backend
            .upload_files(document_id, classeur_id, accepted)
            .await?;
        for file in &mut created {
            file.origin = FileOrigin::Uploaded;
        }

        info!(
            "Attached {} file(s) to document {document_id}",
            created.len()
        );
        self.store.prepend(created.clone());
        Ok(created)
    }

    /// Delete a file server-side, then drop it from the snapshot.
    pub async fn remove(&self, file_id: &str) -> ServiceResult<()> {
        self.backend.delete_file(file_id).await?;
        self.store.remove(file_id);
        Ok(())
    }

    /// Fetch a file's bytes for preview.
    pub async fn preview(&self, file_id: &str) -> ServiceResult<Vec<u8>> {
        self.backend.download_file(file_id).await
    }
}

#[cfg(test)]
#[path = "tests/submitter_tests.rs"]
mod tests;

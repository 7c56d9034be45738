//! Typed client for the archival backend REST API.
//!
//! The backend owns all business logic and authorization; this module is a
//! thin authenticated pass-through. File operations sit behind the
//! [`FileBackend`] trait so workflow code can run against an in-memory fake.

pub mod client;
pub mod files;
pub mod records;

pub use client::BackendClient;
pub use records::{Declaration, DeclarationDraft, Page, PerceptionNote, PerceptionNoteDraft, RecordQuery};

use async_trait::async_trait;

use crate::types::{AttachedFile, LocalFile, ServiceResult};

/// File operations against the backend, as needed by the inventory poller
/// and the upload submitter.
#[async_trait]
pub trait FileBackend: Send + Sync + 'static {
    /// Authoritative listing of files attached to a document.
    async fn list_files(&self, document_id: &str) -> ServiceResult<Vec<AttachedFile>>;

    /// Multipart upload of one or more local files; returns the created
    /// descriptors.
    async fn upload_files(
        &self,
        document_id: &str,
        classeur_id: &str,
        files: Vec<LocalFile>,
    ) -> ServiceResult<Vec<AttachedFile>>;

    /// Delete a single file by id.
    async fn delete_file(&self, file_id: &str) -> ServiceResult<()>;

    /// Fetch a file's content, e.g. for preview.
    async fn download_file(&self, file_id: &str) -> ServiceResult<Vec<u8>>;
}

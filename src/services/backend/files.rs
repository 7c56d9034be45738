use async_trait::async_trait;
use futures_util::StreamExt;
use log::info;
use reqwest::multipart::{Form, Part};

use crate::types::{AttachedFile, LocalFile, ServiceError, ServiceResult};

use super::client::BackendClient;
use super::FileBackend;

fn document_files_path(document_id: &str) -> String {
    format!("api/documents/{document_id}/files")
}

fn file_path(file_id: &str) -> String {
    format!("api/files/{file_id}")
}

#[async_trait]
impl FileBackend for BackendClient {
    async fn list_files(&self, document_id: &str) -> ServiceResult<Vec<AttachedFile>> {
        self.execute_json(self.get(&document_files_path(document_id)))
            .await
    }

    async fn upload_files(
        &self,
        document_id: &str,
        classeur_id: &str,
        files: Vec<LocalFile>,
    ) -> ServiceResult<Vec<AttachedFile>> {
        let mut form = Form::new()
            .text("document_id", document_id.to_string())
            .text("classeur_id", classeur_id.to_string());

        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    ServiceError::Validation(format!(
                        "unusable MIME type {:?}: {e}",
                        file.mime_type
                    ))
                })?;
            form = form.part("files[]", part);
        }

        let request = self
            .post(&document_files_path(document_id))
            .multipart(form);
        let created: Vec<AttachedFile> = self.execute_json(request).await?;
        info!(
            "Uploaded {} file(s) to document {document_id}",
            created.len()
        );
        Ok(created)
    }

    async fn delete_file(&self, file_id: &str) -> ServiceResult<()> {
        self.execute(self.delete(&file_path(file_id))).await?;
        info!("Deleted file {file_id}");
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> ServiceResult<Vec<u8>> {
        let response = self
            .execute(self.get(&format!("{}/content", file_path(file_id))))
            .await?;

        let mut content = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            content.extend_from_slice(&chunk?);
        }
        Ok(content)
    }
}

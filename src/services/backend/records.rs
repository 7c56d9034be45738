//! Declaration and "note de perception" record surfaces.
//!
//! Typed pass-through only: the backend owns validation, numbering, and
//! authorization. These calls back the list/detail screens and the create
//! forms.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::types::ServiceResult;

use super::client::BackendClient;

/// An archived customs declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub id: String,
    pub reference: String,
    pub declarant: String,
    pub classeur_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields the client may set when creating or updating a declaration.
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationDraft {
    pub reference: String,
    pub declarant: String,
    pub classeur_id: String,
}

/// A collection receipt record ("note de perception").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionNote {
    pub id: String,
    pub reference: String,
    pub payer: String,
    pub amount_cents: i64,
    pub classeur_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerceptionNoteDraft {
    pub reference: String,
    pub payer: String,
    pub amount_cents: i64,
    pub classeur_id: String,
}

/// One page of a search/list result.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn page_count(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page as u64) as u32
    }
}

/// Pagination + free-text search parameters for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RecordQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            q: None,
            page: 1,
            per_page: 20,
        }
    }
}

impl RecordQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            q: Some(term.into()),
            ..Self::default()
        }
    }
}

impl BackendClient {
    async fn list_records<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &RecordQuery,
    ) -> ServiceResult<Page<T>> {
        self.execute_json(self.get(path).query(query)).await
    }

    pub async fn list_declarations(&self, query: &RecordQuery) -> ServiceResult<Page<Declaration>> {
        self.list_records("api/declarations", query).await
    }

    pub async fn get_declaration(&self, id: &str) -> ServiceResult<Declaration> {
        self.execute_json(self.get(&format!("api/declarations/{id}")))
            .await
    }

    pub async fn create_declaration(&self, draft: &DeclarationDraft) -> ServiceResult<Declaration> {
        self.execute_json(self.post("api/declarations").json(draft))
            .await
    }

    pub async fn update_declaration(
        &self,
        id: &str,
        draft: &DeclarationDraft,
    ) -> ServiceResult<Declaration> {
        self.execute_json(self.put(&format!("api/declarations/{id}")).json(draft))
            .await
    }

    pub async fn delete_declaration(&self, id: &str) -> ServiceResult<()> {
        self.execute(self.delete(&format!("api/declarations/{id}")))
            .await?;
        Ok(())
    }

    pub async fn list_perception_notes(
        &self,
        query: &RecordQuery,
    ) -> ServiceResult<Page<PerceptionNote>> {
        self.list_records("api/perception-notes", query).await
    }

    pub async fn get_perception_note(&self, id: &str) -> ServiceResult<PerceptionNote> {
        self.execute_json(self.get(&format!("api/perception-notes/{id}")))
            .await
    }

    pub async fn create_perception_note(
        &self,
        draft: &PerceptionNoteDraft,
    ) -> ServiceResult<PerceptionNote> {
        self.execute_json(self.post("api/perception-notes").json(draft))
            .await
    }

    pub async fn update_perception_note(
        &self,
        id: &str,
        draft: &PerceptionNoteDraft,
    ) -> ServiceResult<PerceptionNote> {
        self.execute_json(self.put(&format!("api/perception-notes/{id}")).json(draft))
            .await
    }

    pub async fn delete_perception_note(&self, id: &str) -> ServiceResult<()> {
        self.execute(self.delete(&format!("api/perception-notes/{id}")))
            .await?;
        Ok(())
    }
}

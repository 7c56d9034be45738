use std::time::Duration;

use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::types::{ServiceError, ServiceResult};

/// Authenticated client for the archival backend.
///
/// One reqwest client, built once with an explicit timeout, shared by every
/// service that talks to the backend.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    token: String,
}

impl BackendClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> ServiceResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.post(self.url(path)))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.put(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.delete(self.url(path)))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    /// Send a request and decode a JSON body, mapping non-2xx answers to
    /// `ServiceError::Remote` with the backend's own message when present.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ServiceResult<T> {
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    /// Send a request, returning the raw successful response.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> ServiceResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Backend rejected request: HTTP {status}, body {body:?}");
        Err(ServiceError::Remote {
            status: status.as_u16(),
            message: extract_error_message(&body)
                .unwrap_or_else(|| "the server could not process the request".to_string()),
        })
    }
}

/// Pull a human-readable message out of a structured error payload.
///
/// Accepts `{"message": ...}` and the nested `{"error": {"message": ...}}`
/// shape; anything else yields `None` and callers fall back to a generic
/// message.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value
        .get("message")
        .or_else(|| value.get("error").and_then(|e| e.get("message")))
        .and_then(|m| m.as_str())?;
    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

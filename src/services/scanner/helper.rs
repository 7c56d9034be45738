use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::json;

use crate::types::{DeviceStatus, HelperScanStatus, ScanTarget, ServiceError, ServiceResult};

/// HTTP surface of the local scanner helper process.
///
/// The trait is the seam between workflow code and the real helper; tests
/// substitute an in-memory fake.
#[async_trait]
pub trait ScannerHelper: Send + Sync + 'static {
    /// Aliveness check.
    async fn ping(&self) -> ServiceResult<()>;
    /// Device presence. Only meaningful when `ping` succeeds.
    async fn device_status(&self) -> ServiceResult<DeviceStatus>;
    /// Tell the helper where the backend lives.
    async fn set_target_url(&self, base_url: &str) -> ServiceResult<()>;
    /// Push document/classeur identifiers and the bearer token.
    async fn set_document(&self, target: &ScanTarget) -> ServiceResult<()>;
    /// Fire-and-forget: a 2xx answer means "accepted for processing", not
    /// "scan finished".
    async fn start_scan(&self) -> ServiceResult<()>;
    /// Poll scan progress.
    async fn status(&self) -> ServiceResult<HelperScanStatus>;
}

/// Production client against `http://127.0.0.1:<port>`.
pub struct HelperClient {
    http: Client,
    base_url: String,
}

impl HelperClient {
    /// `timeout` bounds every helper call; probes must resolve quickly so
    /// the UI can keep monitoring passively.
    pub fn new(base_url: &str, timeout: Duration) -> ServiceResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Non-2xx answers with a structured payload become `Remote` (the scan
    /// rejection case); everything else is plain unreachability.
    async fn check(&self, response: Response) -> ServiceResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match crate::services::backend::client::extract_error_message(&body) {
            Some(message) => Err(ServiceError::Remote {
                status: status.as_u16(),
                message,
            }),
            None => Err(ServiceError::Connectivity(format!(
                "scanner helper answered HTTP {status}"
            ))),
        }
    }
}

#[async_trait]
impl ScannerHelper for HelperClient {
    async fn ping(&self) -> ServiceResult<()> {
        let response = self.http.get(self.url("ping")).send().await?;
        self.check(response).await?;
        Ok(())
    }

    async fn device_status(&self) -> ServiceResult<DeviceStatus> {
        let response = self.http.get(self.url("device")).send().await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn set_target_url(&self, base_url: &str) -> ServiceResult<()> {
        let response = self
            .http
            .post(self.url("target"))
            .json(&json!({ "url": base_url }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn set_document(&self, target: &ScanTarget) -> ServiceResult<()> {
        let response = self
            .http
            .post(self.url("document"))
            .json(target)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn start_scan(&self) -> ServiceResult<()> {
        let response = self.http.post(self.url("scan/start")).send().await?;
        self.check(response).await?;
        Ok(())
    }

    async fn status(&self) -> ServiceResult<HelperScanStatus> {
        let response = self.http.get(self.url("scan/status")).send().await?;
        Ok(self.check(response).await?.json().await?)
    }
}

//! Application configuration and session state.
//!
//! Everything here is built once at bootstrap and injected explicitly into
//! the services that need it. There is no ambient/global configuration:
//! the owning application constructs an [`AppConfig`], loads the
//! [`session::SessionStore`], and passes both to `AppContext`.

pub mod session;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default localhost port of the scanner helper process.
pub const DEFAULT_SCANNER_PORT: u16 = 8737;

/// The only MIME type accepted by the manual upload path.
pub const ACCEPTED_UPLOAD_MIME: &str = "application/pdf";

/// Static configuration for the acquisition client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the archival backend, without a trailing slash.
    pub backend_base_url: String,
    /// Localhost port the scanner helper listens on.
    pub scanner_port: u16,
    /// Path of the JSON session file written by the login flow.
    pub session_file: PathBuf,
    /// Timeout for backend requests.
    pub http_timeout: Duration,
    /// Bounded timeout for helper probes (aliveness + device checks).
    pub probe_timeout: Duration,
    /// Passive monitoring cadence of the connection prober.
    pub probe_interval: Duration,
    /// Inventory poll cadence while no scan is running.
    pub poll_idle_interval: Duration,
    /// Inventory poll cadence while a scan session is awaiting files.
    pub poll_active_interval: Duration,
    /// Safety deadline for a scan session awaiting new files.
    pub scan_deadline: Duration,
    /// MIME type accepted by the upload submitter.
    pub accepted_upload_mime: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_base_url: "http://localhost:8080".to_string(),
            scanner_port: DEFAULT_SCANNER_PORT,
            session_file: PathBuf::from("session.json"),
            http_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(3),
            probe_interval: Duration::from_secs(10),
            poll_idle_interval: Duration::from_secs(3),
            poll_active_interval: Duration::from_millis(1500),
            scan_deadline: Duration::from_secs(180),
            accepted_upload_mime: ACCEPTED_UPLOAD_MIME.to_string(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset. Reads a `.env` file first when present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Ok(url) = env::var("ARCHISCAN_BACKEND_URL") {
            config.backend_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(port) = env_parsed("ARCHISCAN_SCANNER_PORT") {
            config.scanner_port = port;
        }
        if let Ok(path) = env::var("ARCHISCAN_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(secs) = env_parsed("ARCHISCAN_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parsed("ARCHISCAN_SCAN_DEADLINE_SECS") {
            config.scan_deadline = Duration::from_secs(secs);
        }
        config
    }

    /// Base URL of the scanner helper on localhost.
    pub fn scanner_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.scanner_port)
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring unparseable {key}={raw}");
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

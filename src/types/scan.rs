use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of probing the local scanner helper. Transient: rebuilt on every
/// probe tick, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScannerConnectionStatus {
    pub server_reachable: bool,
    pub device_detected: bool,
    pub last_error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ScannerConnectionStatus {
    pub fn unreachable(error: impl Into<String>) -> Self {
        Self {
            server_reachable: false,
            device_detected: false,
            last_error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn ready(&self) -> bool {
        self.server_reachable && self.device_detected
    }
}

impl Default for ScannerConnectionStatus {
    fn default() -> Self {
        Self {
            server_reachable: false,
            device_detected: false,
            last_error: None,
            checked_at: Utc::now(),
        }
    }
}

/// Device-presence answer from the helper.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStatus {
    pub detected: bool,
    #[serde(default)]
    pub name: Option<String>,
}

/// Progress answer from the helper's status endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelperScanStatus {
    pub is_scanning: bool,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Document info pushed to the helper before a scan starts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTarget {
    pub document_id: String,
    pub classeur_id: String,
    pub token: String,
}

/// States of one scan attempt. At most one session per controller may be in
/// `Scanning` or `AwaitingFiles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanSessionState {
    #[default]
    Idle,
    Configuring,
    Scanning,
    AwaitingFiles,
    Completed,
    Cancelled,
    TimedOut,
    Failed,
}

impl ScanSessionState {
    /// A session in an active state blocks new scan attempts and accepts
    /// cancellation.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ScanSessionState::Configuring
                | ScanSessionState::Scanning
                | ScanSessionState::AwaitingFiles
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ScanSessionState::Completed
                | ScanSessionState::Cancelled
                | ScanSessionState::TimedOut
                | ScanSessionState::Failed
        )
    }
}

/// How a scan attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ScanOutcome {
    /// The inventory observed new files within the deadline.
    Completed { files_added: usize },
    Cancelled,
    TimedOut,
}

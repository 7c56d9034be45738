use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{ServiceError, ServiceResult};

/// The login session as written by the (out of scope) login flow: a bearer
/// token plus an opaque user object. This client only ever reads it.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(default)]
    pub user: serde_json::Value,
}

/// Read-only access to the JSON session file.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse the session file. A missing or malformed file means
    /// the user is not logged in as far as this client is concerned.
    pub fn load(&self) -> ServiceResult<AuthSession> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            ServiceError::Validation(format!(
                "no usable session at {}: {e}",
                self.path.display()
            ))
        })?;
        let session: AuthSession = serde_json::from_str(&raw)
            .map_err(|e| ServiceError::Validation(format!("malformed session file: {e}")))?;
        if session.token.trim().is_empty() {
            return Err(ServiceError::Validation(
                "session file carries no token".to_string(),
            ));
        }
        Ok(session)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

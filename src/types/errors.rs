use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Backend or scanner helper could not be reached. Always recoverable:
    /// retried on the next tick or via a user-triggered retry.
    #[error("connection error: {0}")]
    Connectivity(String),
    /// Caught before any network call (wrong file type, missing identifiers).
    #[error("{0}")]
    Validation(String),
    /// The remote side answered with a structured rejection.
    #[error("request rejected (HTTP {status}): {message}")]
    Remote { status: u16, message: String },
    /// A deadline elapsed. Distinct from both success and cancellation.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        // Request timeouts count as unreachability; the Timeout variant is
        // reserved for workflow deadlines (scan safety deadline).
        ServiceError::Connectivity(error.to_string())
    }
}

impl Serialize for ServiceError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

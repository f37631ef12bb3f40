use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes the backend attaches to failed decisions.
pub mod codes {
    /// A service the backend depends on (voting power lookup) is down.
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const AUTH_REQUIRED: &str = "AUTH_REQUIRED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const EXPIRED: &str = "EXPIRED";
    pub const NOT_ACTIVE: &str = "NOT_ACTIVE";
    pub const ALREADY_VOTED: &str = "ALREADY_VOTED";
    pub const NO_VOTING_POWER: &str = "NO_VOTING_POWER";
    pub const NO_STATION_LINKED: &str = "NO_STATION_LINKED";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail(pub String, pub String);

/// Structured error returned by the backend, mirroring Orbit's `Error`
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ErrorDetail>>,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn is_service_unavailable(&self) -> bool {
        self.code == codes::SERVICE_UNAVAILABLE
    }

    /// Message suitable for a notification; falls back to the code.
    pub fn display_message(&self) -> &str {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.code)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code, message),
            None => f.write_str(&self.code),
        }
    }
}

//! Feed error types.

use daopad_orbit::{BackendError, codes};

/// Errors from the feed and the remote actor it talks to.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Connection or protocol failure before a response arrived.
    #[error("HTTP error calling {method}: {source}")]
    Transport {
        method: &'static str,
        source: reqwest::Error,
    },
    /// The gateway answered with a non-2xx status.
    #[error("{method} returned {status}: {body}")]
    Status {
        method: &'static str,
        status: u16,
        body: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response from {method}: {reason}")]
    Decode { method: &'static str, reason: String },
    /// The backend reported a business error.
    #[error("{message}")]
    Backend {
        code: Option<String>,
        message: String,
    },
    /// A service the backend depends on is temporarily down.
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },
    #[error("invalid token id: {0:?}")]
    InvalidTokenId(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("identity cannot be sent as a header")]
    InvalidIdentity,
    #[error("no token selected")]
    NoToken,
    #[error("authentication required")]
    AuthRequired,
    #[error("operation cancelled by teardown")]
    Cancelled,
}

impl FeedError {
    /// Machine-readable code, when one exists.
    pub fn code(&self) -> Option<&str> {
        match self {
            FeedError::Backend { code, .. } => code.as_deref(),
            FeedError::ServiceUnavailable { .. } => Some(codes::SERVICE_UNAVAILABLE),
            FeedError::AuthRequired => Some(codes::AUTH_REQUIRED),
            _ => None,
        }
    }

    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, FeedError::ServiceUnavailable { .. })
    }
}

impl From<BackendError> for FeedError {
    fn from(e: BackendError) -> Self {
        if e.is_service_unavailable() {
            return FeedError::ServiceUnavailable {
                message: e.display_message().to_string(),
            };
        }
        if e.code == codes::AUTH_REQUIRED {
            return FeedError::AuthRequired;
        }
        FeedError::Backend {
            message: e.display_message().to_string(),
            code: Some(e.code),
        }
    }
}

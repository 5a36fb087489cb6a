use std::time::Duration;

use thiserror::Error;

/// Client-side failure taxonomy. Authentication failures trigger recovery;
/// transport and server failures never do - a fresh token cannot fix a
/// network outage.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network failure: {0}")]
    Network(String),

    #[error("no access token available for {0}; please sign in")]
    NoToken(String),

    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    #[error("server failure (status {status})")]
    Server { status: u16 },

    #[error("request failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("session storage failure: {0}")]
    Storage(String),
}

impl ClientError {
    /// Failures that credential recovery can fix.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::NoToken(_) | ClientError::Unauthenticated(_)
        )
    }

    /// Transient failures worth retrying as-is, without touching credentials.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout(_) | ClientError::Network(_) | ClientError::Server { .. }
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(crate::api::REQUEST_TIMEOUT)
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

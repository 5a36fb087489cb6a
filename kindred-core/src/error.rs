use thiserror::Error;

use crate::demo::DemoError;

/// Verification failure taxonomy shared by every strategy and the cascade.
///
/// Strategies return these instead of throwing; unexpected faults are
/// degraded to `MethodsExhausted` rather than crashing the cascade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("no authentication credentials provided: {0}")]
    MissingCredential(String),

    #[error("malformed credentials: {0}")]
    MalformedCredential(String),

    #[error("credentials expired: {age_hours:.1}h old, limit is {window_hours}h")]
    ExpiredCredential { age_hours: f64, window_hours: f64 },

    #[error("no user found for {0}")]
    UnknownUser(String),

    #[error("all authentication methods failed: {0}")]
    MethodsExhausted(String),
}

impl From<DemoError> for AuthError {
    fn from(err: DemoError) -> Self {
        match err {
            DemoError::InvalidId | DemoError::InvalidTimestamp => {
                AuthError::MalformedCredential(err.to_string())
            }
            DemoError::Expired {
                age_hours,
                window_hours,
            } => AuthError::ExpiredCredential {
                age_hours,
                window_hours,
            },
        }
    }
}

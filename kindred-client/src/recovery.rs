//! Token recovery orchestrator.
//!
//! Restores a usable credential into the token manager when it is empty or
//! was just rejected: in-memory slot first, then the durable backup, then
//! the external session provider. Each source is tried at most once per
//! recovery pass and recovery itself runs at most once per failed
//! operation.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kindred_core::demo;

use crate::error::ClientError;
use crate::provider::SessionProvider;
use crate::session_store::SessionStore;
use crate::token::TokenManager;

/// Acceptable age of a backed-up demo token. Wider than the server's 24h
/// bearer window on both sides: an hour of negative tolerance for clock
/// skew, and 25h on top so recovery never installs a token that is about to
/// lose a race with the server boundary.
pub const STORED_TOKEN_MIN_AGE_HOURS: f64 = -1.0;
pub const STORED_TOKEN_MAX_AGE_HOURS: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoverySource {
    AlreadyPresent,
    DurableStorage,
    Provider,
}

pub struct TokenRecovery {
    tokens: Arc<TokenManager>,
    sessions: Arc<dyn SessionStore>,
    provider: Arc<dyn SessionProvider>,
}

impl TokenRecovery {
    pub fn new(
        tokens: Arc<TokenManager>,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            tokens,
            sessions,
            provider,
        }
    }

    /// Make sure the token manager holds a usable credential, reporting
    /// where it came from. Fails only when every source is exhausted, at
    /// which point the user must re-authenticate.
    pub async fn ensure_token_available(
        &self,
        now: DateTime<Utc>,
    ) -> Result<RecoverySource, ClientError> {
        if let Some(token) = self.tokens.access_token() {
            if token_usable(&token, now) {
                return Ok(RecoverySource::AlreadyPresent);
            }
            tracing::debug!("in-memory token unusable, attempting recovery");
        }

        if self.recover_from_durable(now).await? {
            return Ok(RecoverySource::DurableStorage);
        }

        if self.recover_from_provider().await? {
            return Ok(RecoverySource::Provider);
        }

        Err(ClientError::Unauthenticated(
            "no recoverable session; please sign in again".to_string(),
        ))
    }

    /// Try to install the durable backup's token. Expired or malformed
    /// backups are deleted here - this is the only place that deletes them.
    pub(crate) async fn recover_from_durable(
        &self,
        now: DateTime<Utc>,
    ) -> Result<bool, ClientError> {
        let session = match self.sessions.load().await {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(false),
            Err(err) => {
                tracing::warn!(error = %err, "unreadable session backup, deleting");
                self.sessions.clear().await?;
                return Ok(false);
            }
        };

        match demo::parse_timestamp(&session.access_token, demo::DEMO_TOKEN_PREFIX) {
            Ok(ts) => {
                let age = demo::age_hours(ts, now);
                if age > STORED_TOKEN_MIN_AGE_HOURS && age < STORED_TOKEN_MAX_AGE_HOURS {
                    tracing::info!(age_hours = age, "restored token from durable backup");
                    self.tokens
                        .set_access_token(Some(session.access_token.clone()));
                    Ok(true)
                } else {
                    tracing::info!(age_hours = age, "session backup outside window, deleting");
                    self.sessions.clear().await?;
                    Ok(false)
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "session backup holds a malformed token, deleting");
                self.sessions.clear().await?;
                Ok(false)
            }
        }
    }

    /// Ask the external session provider for a live session.
    pub(crate) async fn recover_from_provider(&self) -> Result<bool, ClientError> {
        match self.provider.current_session().await {
            Ok(Some(session)) if !session.access_token.is_empty() => {
                tracing::info!("restored token from session provider");
                self.tokens.set_access_token(Some(session.access_token));
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(err) => {
                // A provider fault is not "no session"; surface transport
                // errors instead of silently asking for re-auth.
                if err.is_transient() {
                    Err(err)
                } else {
                    tracing::debug!(error = %err, "provider declined session lookup");
                    Ok(false)
                }
            }
        }
    }

    /// Run `operation`; on an authentication failure, recover once and
    /// retry exactly once. Any other failure, and a failed recovery, re-raise
    /// the original error unmodified.
    pub async fn with_recovery<T, F, Fut>(&self, operation: F) -> Result<T, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        match operation().await {
            Ok(value) => Ok(value),
            Err(err) if err.is_auth_failure() => {
                tracing::info!(error = %err, "operation failed authentication, attempting recovery");
                match self.ensure_token_available(Utc::now()).await {
                    Ok(source) => {
                        tracing::info!(source = ?source, "recovered, retrying operation once");
                        operation().await
                    }
                    Err(recovery_err) => {
                        tracing::warn!(error = %recovery_err, "recovery failed");
                        Err(err)
                    }
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// Lazy validity judgement for the in-memory slot: demo tokens are usable
/// inside the backup window, provider tokens are assumed valid until the
/// server says otherwise.
fn token_usable(token: &str, now: DateTime<Utc>) -> bool {
    match demo::parse_timestamp(token, demo::DEMO_TOKEN_PREFIX) {
        Ok(ts) => {
            let age = demo::age_hours(ts, now);
            age > STORED_TOKEN_MIN_AGE_HOURS && age < STORED_TOKEN_MAX_AGE_HOURS
        }
        Err(_) => !token.is_empty(),
    }
}

//! External session provider adapter.
//!
//! Recovery's last resort: ask the identity provider whether it still holds
//! a live session for this client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::ClientError;

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<ProviderSession>, ClientError>;
}

pub struct HttpSessionProvider {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl HttpSessionProvider {
    pub fn new(base_url: String, anon_key: String) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            anon_key,
        })
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn current_session(&self) -> Result<Option<ProviderSession>, ClientError> {
        let url = format!("{}/auth/v1/session", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(ClientError::from)?;

        match response.status() {
            status if status.is_success() => {
                let session: ProviderSession =
                    response.json().await.map_err(ClientError::from)?;
                if session.access_token.is_empty() {
                    return Ok(None);
                }
                Ok(Some(session))
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(ClientError::Api {
                status: status.as_u16(),
                message: "unexpected response fetching provider session".to_string(),
            }),
        }
    }
}

/// In-memory provider for tests.
#[derive(Default)]
pub struct MockSessionProvider {
    session: std::sync::Mutex<Option<ProviderSession>>,
    pub calls: std::sync::atomic::AtomicU32,
}

impl MockSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            session: std::sync::Mutex::new(Some(ProviderSession {
                access_token: token.to_string(),
            })),
            calls: std::sync::atomic::AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn current_session(&self) -> Result<Option<ProviderSession>, ClientError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let session = self
            .session
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone();
        Ok(session)
    }
}

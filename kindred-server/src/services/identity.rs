//! Identity provider adapter.
//!
//! Wraps the external identity service's REST API behind a trait so the
//! verification cascade and handlers never touch HTTP details, and tests can
//! inject a mock.

use async_trait::async_trait;
use kindred_core::AuthUser;
use reqwest::Client;
use std::time::Duration;

use crate::config::IdentityConfig;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a provider-issued access token; `None` when the token is not
    /// recognized.
    async fn verify_token(&self, access_token: &str) -> Result<Option<AuthUser>, anyhow::Error>;

    /// Look up a user by id; `None` when no such user exists.
    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<AuthUser>, anyhow::Error>;

    /// Create a new real (non-demo) user.
    async fn create_user(
        &self,
        email: &str,
        phone: Option<&str>,
    ) -> Result<AuthUser, anyhow::Error>;
}

pub struct HttpIdentityProvider {
    client: Client,
    settings: IdentityConfig,
}

impl HttpIdentityProvider {
    pub fn new(settings: IdentityConfig) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build identity HTTP client: {}", e))?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, access_token: &str) -> Result<Option<AuthUser>, anyhow::Error> {
        let url = format!("{}/auth/v1/user", self.settings.url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.settings.service_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "identity provider token verification failed");
                anyhow::anyhow!("HTTP request failed: {}", e)
            })?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = response.json().await?;
                Ok(Some(user))
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(anyhow::anyhow!(
                "identity provider returned {} verifying token",
                status
            )),
        }
    }

    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<AuthUser>, anyhow::Error> {
        let url = format!("{}/auth/v1/admin/users/{}", self.settings.url, user_id);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.settings.service_key)
            .bearer_auth(&self.settings.service_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user_id, "identity provider lookup failed");
                anyhow::anyhow!("HTTP request failed: {}", e)
            })?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = response.json().await?;
                Ok(Some(user))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(anyhow::anyhow!(
                "identity provider returned {} looking up user",
                status
            )),
        }
    }

    async fn create_user(
        &self,
        email: &str,
        phone: Option<&str>,
    ) -> Result<AuthUser, anyhow::Error> {
        let url = format!("{}/auth/v1/admin/users", self.settings.url);
        let mut body = serde_json::json!({
            "email": email,
            "email_confirm": true,
        });
        if let Some(phone) = phone {
            body["phone"] = serde_json::Value::String(phone.to_string());
        }

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.settings.service_key)
            .bearer_auth(&self.settings.service_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "identity provider user creation failed");
                anyhow::anyhow!("HTTP request failed: {}", e)
            })?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "identity provider returned {} creating user",
                response.status()
            ));
        }

        let user: AuthUser = response.json().await?;
        Ok(user)
    }
}

/// In-memory provider for tests and dev mode.
pub struct MockIdentityProvider {
    pub users: std::sync::Mutex<std::collections::HashMap<String, AuthUser>>,
    pub tokens: std::sync::Mutex<std::collections::HashMap<String, AuthUser>>,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            users: std::sync::Mutex::new(std::collections::HashMap::new()),
            tokens: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn insert_user(&self, user: AuthUser) {
        self.users
            .lock()
            .expect("mock users mutex poisoned")
            .insert(user.id.clone(), user);
    }

    pub fn insert_token(&self, token: &str, user: AuthUser) {
        self.tokens
            .lock()
            .expect("mock tokens mutex poisoned")
            .insert(token.to_string(), user);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn verify_token(&self, access_token: &str) -> Result<Option<AuthUser>, anyhow::Error> {
        let user = self
            .tokens
            .lock()
            .map_err(|e| anyhow::anyhow!("mock tokens mutex poisoned: {}", e))?
            .get(access_token)
            .cloned();
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<AuthUser>, anyhow::Error> {
        let user = self
            .users
            .lock()
            .map_err(|e| anyhow::anyhow!("mock users mutex poisoned: {}", e))?
            .get(user_id)
            .cloned();
        Ok(user)
    }

    async fn create_user(
        &self,
        email: &str,
        phone: Option<&str>,
    ) -> Result<AuthUser, anyhow::Error> {
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            phone: phone.map(|p| p.to_string()),
            created_at: chrono::Utc::now(),
            app_metadata: serde_json::Map::new(),
            user_metadata: serde_json::Map::new(),
            aud: "authenticated".to_string(),
        };
        self.insert_user(user.clone());
        Ok(user)
    }
}

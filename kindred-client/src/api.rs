//! API client.
//!
//! Builds every outbound call, deciding which credential to attach, and
//! owns the 401 recovery-retry loop. The loop is an explicit bounded state
//! machine: attempt, recover on rejection, retry, give up after
//! `MAX_RETRIES` recoveries.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kindred_core::{demo, AuthUser, StoredSession};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::provider::SessionProvider;
use crate::recovery::TokenRecovery;
use crate::session_store::SessionStore;
use crate::token::{TokenKind, TokenManager, TokenStatus};

pub const MAX_RETRIES: u32 = 2;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints reachable with the anonymous key alone.
const PUBLIC_ENDPOINTS: &[&str] = &["/auth/signup", "/health"];

#[derive(Debug, Clone)]
enum Credential {
    Bearer(String),
    AnonKey,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: Arc<TokenManager>,
    sessions: Arc<dyn SessionStore>,
    recovery: TokenRecovery,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        tokens: Arc<TokenManager>,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn SessionProvider>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {}", e)))?;

        let recovery = TokenRecovery::new(tokens.clone(), sessions.clone(), provider);

        Ok(Self {
            http,
            config,
            tokens,
            sessions,
            recovery,
        })
    }

    pub fn recovery(&self) -> &TokenRecovery {
        &self.recovery
    }

    pub fn token_status(&self) -> TokenStatus {
        self.tokens.status()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        self.tokens.set_access_token(token);
    }

    /// Resolution order for the credential to attach: in-memory token,
    /// anonymous key for public endpoints, then one recovery pass before
    /// failing outright.
    async fn resolve_credential(&self, endpoint: &str) -> Result<Credential, ClientError> {
        if let Some(token) = self.tokens.access_token() {
            return Ok(Credential::Bearer(token));
        }

        if PUBLIC_ENDPOINTS.contains(&endpoint) {
            return Ok(Credential::AnonKey);
        }

        if self.recovery.ensure_token_available(Utc::now()).await.is_ok() {
            if let Some(token) = self.tokens.access_token() {
                return Ok(Credential::Bearer(token));
            }
        }

        Err(ClientError::NoToken(endpoint.to_string()))
    }

    /// Flavor-specific recovery after a 401: demo tokens come back from the
    /// durable backup, provider tokens from the session provider. The
    /// rejected token is dropped first so recovery cannot hand it straight
    /// back.
    async fn recover_after_rejection(&self, credential: &Credential) -> bool {
        match credential {
            Credential::Bearer(token) if demo::is_demo_token(token) => {
                self.tokens.set_access_token(None);
                self.recovery
                    .recover_from_durable(Utc::now())
                    .await
                    .unwrap_or(false)
            }
            Credential::Bearer(_) => {
                self.tokens.set_access_token(None);
                self.recovery.recover_from_provider().await.unwrap_or(false)
            }
            Credential::AnonKey => false,
        }
    }

    /// Perform a call against `endpoint`. One retry per successful
    /// recovery, at most `MAX_RETRIES` recoveries, so at most
    /// `MAX_RETRIES + 1` attempts in total.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let mut attempt: u32 = 0;

        loop {
            let credential = self.resolve_credential(endpoint).await?;
            let url = format!("{}{}", self.config.base_url, endpoint);

            let mut builder = self.http.request(method.clone(), &url);
            builder = match &credential {
                Credential::Bearer(token) => builder.bearer_auth(token),
                Credential::AnonKey => builder.header("x-api-key", &self.config.anon_key),
            };
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(ClientError::from)?;
            let status = response.status();

            if status.is_success() {
                if status == StatusCode::NO_CONTENT {
                    return Ok(Value::Null);
                }
                return response.json().await.map_err(ClientError::from);
            }

            if status == StatusCode::UNAUTHORIZED {
                if attempt < MAX_RETRIES && self.recover_after_rejection(&credential).await {
                    attempt += 1;
                    tracing::info!(
                        endpoint = endpoint,
                        attempt = attempt,
                        "credentials rejected, recovered, retrying"
                    );
                    continue;
                }
                return Err(ClientError::Unauthenticated(
                    "credentials rejected; please sign in again".to_string(),
                ));
            }

            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("status {}", status.as_u16()));

            if status.is_server_error() {
                tracing::warn!(endpoint = endpoint, status = status.as_u16(), "server failure");
                return Err(ClientError::Server {
                    status: status.as_u16(),
                });
            }

            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
    }

    // --- operation surface ---

    /// Demo signup: mints a demo session server-side, persists the durable
    /// backup and primes the token slot.
    pub async fn signup_demo(&self, auth_type: &str) -> Result<StoredSession, ClientError> {
        let value = self
            .request(
                Method::POST,
                "/auth/signup",
                Some(json!({ "demo": true, "auth_type": auth_type })),
            )
            .await?;

        let session: StoredSession = serde_json::from_value(value)
            .map_err(|e| ClientError::Api {
                status: 200,
                message: format!("unexpected signup response: {}", e),
            })?;

        self.sessions.save(&session).await?;
        self.tokens
            .set_access_token(Some(session.access_token.clone()));

        Ok(session)
    }

    /// Real signup through the identity provider.
    pub async fn signup(&self, email: &str, phone: Option<&str>) -> Result<AuthUser, ClientError> {
        let value = self
            .request(
                Method::POST,
                "/auth/signup",
                Some(json!({ "email": email, "phone": phone })),
            )
            .await?;

        serde_json::from_value(value["user"].clone()).map_err(|e| ClientError::Api {
            status: 200,
            message: format!("unexpected signup response: {}", e),
        })
    }

    pub async fn create_profile(&self, profile: Value) -> Result<Value, ClientError> {
        self.request(Method::POST, "/profile", Some(profile)).await
    }

    pub async fn get_profile(&self) -> Result<Value, ClientError> {
        self.request(Method::GET, "/profile", None).await
    }

    pub async fn save_personality_results(&self, results: Value) -> Result<Value, ClientError> {
        self.request(Method::POST, "/personality/results", Some(results))
            .await
    }

    pub async fn get_personality_results(&self) -> Result<Value, ClientError> {
        self.request(Method::GET, "/personality/results", None).await
    }

    pub async fn get_matches(&self) -> Result<Value, ClientError> {
        self.request(Method::GET, "/matches", None).await
    }

    pub async fn send_message(&self, to: &str, body: &str) -> Result<Value, ClientError> {
        self.request(
            Method::POST,
            "/chat/messages",
            Some(json!({ "to": to, "body": body })),
        )
        .await
    }

    pub async fn get_chat_history(&self, peer: &str) -> Result<Value, ClientError> {
        self.request(
            Method::GET,
            &format!("/chat/messages?peer={}", peer),
            None,
        )
        .await
    }

    pub async fn get_daily_question(&self) -> Result<Value, ClientError> {
        self.request(Method::GET, "/community/daily-question", None)
            .await
    }

    pub async fn answer_daily_question(&self, answer: &str) -> Result<Value, ClientError> {
        self.request(
            Method::POST,
            "/community/daily-question/answer",
            Some(json!({ "answer": answer })),
        )
        .await
    }

    pub async fn record_consent(&self, kind: &str, granted: bool) -> Result<Value, ClientError> {
        self.request(
            Method::POST,
            "/consent",
            Some(json!({ "kind": kind, "granted": granted })),
        )
        .await
    }

    pub async fn request_export(&self) -> Result<Value, ClientError> {
        self.request(Method::POST, "/privacy/export", None).await
    }

    pub async fn request_deletion(&self) -> Result<Value, ClientError> {
        self.request(Method::POST, "/privacy/deletion", None).await
    }

    pub async fn log_analytics(&self, event: &str, properties: Value) -> Result<(), ClientError> {
        self.request(
            Method::POST,
            "/analytics/events",
            Some(json!({ "event": event, "properties": properties })),
        )
        .await
        .map(|_| ())
    }

    /// Health probe. Always anonymous; never consults the token slot or
    /// recovery.
    pub async fn health_check(&self) -> Result<Value, ClientError> {
        let url = format!("{}/health", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .header("x-api-key", &self.config.anon_key)
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(ClientError::from);
        }
        Err(ClientError::Server {
            status: status.as_u16(),
        })
    }

    /// Expose the token kind currently attached to outbound calls, for
    /// diagnostics.
    pub fn token_kind(&self) -> Option<TokenKind> {
        self.tokens.status().kind
    }
}

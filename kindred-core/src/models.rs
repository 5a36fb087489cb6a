//! Shared auth data model - used by both the server cascade and the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Authenticated user record.
///
/// Demo users are synthesized deterministically from the timestamp embedded
/// in their identifier; real users are opaque identity-provider records of
/// which only `id` is ever read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub app_metadata: Map<String, serde_json::Value>,
    #[serde(default)]
    pub user_metadata: Map<String, serde_json::Value>,
    #[serde(default = "default_aud")]
    pub aud: String,
}

fn default_aud() -> String {
    "authenticated".to_string()
}

impl AuthUser {
    pub fn is_demo(&self) -> bool {
        self.app_metadata
            .get("demo")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Token pair issued for demo flows and kept as the client's durable backup.
///
/// Lifetime is exactly `demo::SESSION_TTL_SECONDS` from creation. Only
/// session-creation flows produce one; only the recovery orchestrator
/// deletes the persisted copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub expires_at: i64,
    pub token_type: String,
    pub user: AuthUser,
}

impl StoredSession {
    /// Build the demo token pair for a synthesized user.
    pub fn demo(user: AuthUser, timestamp_ms: i64, now: DateTime<Utc>) -> Self {
        Self {
            access_token: format!("{}{}", crate::demo::DEMO_TOKEN_PREFIX, timestamp_ms),
            refresh_token: format!("demo-refresh-{}", timestamp_ms),
            expires_in: crate::demo::SESSION_TTL_SECONDS,
            expires_at: now.timestamp() + crate::demo::SESSION_TTL_SECONDS,
            token_type: "bearer".to_string(),
            user,
        }
    }
}

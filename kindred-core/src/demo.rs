//! Demo identity synthesizer.
//!
//! Demo users carry their own creation instant as a millisecond timestamp
//! embedded in the identifier (`demo-user-<ms>`) or token
//! (`demo-token-<ms>`), so a user record can be rebuilt from the identifier
//! alone - no store lookup. Validity is judged purely by age against the
//! caller's window.

use chrono::{DateTime, Utc};
use serde_json::Map;
use thiserror::Error;

use crate::models::AuthUser;

pub const DEMO_USER_PREFIX: &str = "demo-user-";
pub const DEMO_TOKEN_PREFIX: &str = "demo-token-";
pub const DEMO_EMAIL_DOMAIN: &str = "demo.kindred.app";

/// Window for session-style demo credentials (token-free, legacy, marker).
pub const SESSION_WINDOW_HOURS: f64 = 48.0;
/// Window for demo bearer tokens. Narrower than the session window; the
/// asymmetry is deliberate grace for the header style and must hold.
pub const TOKEN_WINDOW_HOURS: f64 = 24.0;
/// Lifetime of an issued demo token pair.
pub const SESSION_TTL_SECONDS: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DemoError {
    #[error("identifier does not match the demo pattern")]
    InvalidId,
    #[error("demo identifier carries a non-positive or non-numeric timestamp")]
    InvalidTimestamp,
    #[error("demo session expired: {age_hours:.1}h old, window is {window_hours}h")]
    Expired { age_hours: f64, window_hours: f64 },
}

pub fn is_demo_user_id(id: &str) -> bool {
    parse_timestamp(id, DEMO_USER_PREFIX).is_ok()
}

pub fn is_demo_token(token: &str) -> bool {
    parse_timestamp(token, DEMO_TOKEN_PREFIX).is_ok()
}

/// Extract the embedded creation timestamp (ms) from a prefixed identifier.
pub fn parse_timestamp(value: &str, prefix: &str) -> Result<i64, DemoError> {
    let rest = value.strip_prefix(prefix).ok_or(DemoError::InvalidId)?;
    let ts: i64 = rest.parse().map_err(|_| DemoError::InvalidTimestamp)?;
    if ts <= 0 {
        return Err(DemoError::InvalidTimestamp);
    }
    Ok(ts)
}

/// Rebuild the demo user for `user_id`, enforcing the upper age bound only.
/// A negative age (future timestamp, clock skew) passes.
pub fn synthesize_user(
    user_id: &str,
    window_hours: f64,
    now: DateTime<Utc>,
    auth_type: &str,
) -> Result<AuthUser, DemoError> {
    let ts = parse_timestamp(user_id, DEMO_USER_PREFIX)?;
    check_age(ts, window_hours, now)?;
    Ok(build_user(user_id, ts, auth_type))
}

/// Rebuild the demo user behind a `demo-token-<ms>` bearer token.
pub fn demo_user_from_token(
    token: &str,
    window_hours: f64,
    now: DateTime<Utc>,
) -> Result<AuthUser, DemoError> {
    let ts = parse_timestamp(token, DEMO_TOKEN_PREFIX)?;
    check_age(ts, window_hours, now)?;
    let user_id = format!("{}{}", DEMO_USER_PREFIX, ts);
    Ok(build_user(&user_id, ts, "demo-token"))
}

/// Age in hours of a millisecond timestamp relative to `now`.
pub fn age_hours(timestamp_ms: i64, now: DateTime<Utc>) -> f64 {
    (now.timestamp_millis() - timestamp_ms) as f64 / 3_600_000.0
}

fn check_age(timestamp_ms: i64, window_hours: f64, now: DateTime<Utc>) -> Result<(), DemoError> {
    let age = age_hours(timestamp_ms, now);
    if age > window_hours {
        return Err(DemoError::Expired {
            age_hours: age,
            window_hours,
        });
    }
    Ok(())
}

fn build_user(user_id: &str, timestamp_ms: i64, auth_type: &str) -> AuthUser {
    let created_at = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_else(Utc::now);

    let mut app_metadata = Map::new();
    app_metadata.insert("demo".to_string(), serde_json::Value::Bool(true));
    app_metadata.insert(
        "authType".to_string(),
        serde_json::Value::String(auth_type.to_string()),
    );

    AuthUser {
        id: user_id.to_string(),
        email: format!("demo{}@{}", timestamp_ms, DEMO_EMAIL_DOMAIN),
        phone: None,
        created_at,
        app_metadata,
        user_metadata: Map::new(),
        aud: "authenticated".to_string(),
    }
}

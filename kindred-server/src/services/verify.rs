//! Credential verification cascade.
//!
//! Inbound requests may authenticate four different ways. The cascade tries
//! each strategy in a fixed priority order and stops at the first one that
//! yields a user. Strategies are plain async functions with a uniform
//! contract: `Ok(Some(user))` on success, `Ok(None)` when the headers the
//! strategy needs are absent, `Err` when the strategy applied but the
//! credential failed. Order is the tie-break; strategies are never raced.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use kindred_core::{demo, AuthError, AuthUser};

use super::identity::IdentityProvider;

pub const HEADER_SESSION_ID: &str = "x-session-id";
pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_IS_DEMO: &str = "x-is-demo";
pub const HEADER_API_KEY: &str = "x-api-key";

const SESSION_PREFIX: &str = "Session ";
const BEARER_PREFIX: &str = "Bearer ";

type StrategyResult = Result<Option<AuthUser>, AuthError>;

/// Run the cascade over the request headers.
///
/// The returned error is the first applicable strategy's failure when one
/// exists, otherwise a diagnostic synthesized from which headers were
/// present.
pub async fn verify_request(
    headers: &HeaderMap,
    identity: &dyn IdentityProvider,
    now: DateTime<Utc>,
) -> Result<AuthUser, AuthError> {
    let mut first_failure: Option<AuthError> = None;

    if let Some(user) = note(
        "token-free",
        verify_token_free(headers, identity, now).await,
        &mut first_failure,
    ) {
        return Ok(user);
    }
    if let Some(user) = note(
        "legacy-session",
        verify_legacy_session(headers, identity, now).await,
        &mut first_failure,
    ) {
        return Ok(user);
    }
    if let Some(user) = note(
        "bearer",
        verify_bearer(headers, identity, now).await,
        &mut first_failure,
    ) {
        return Ok(user);
    }
    if let Some(user) = note(
        "demo-marker",
        verify_demo_marker(headers, now),
        &mut first_failure,
    ) {
        return Ok(user);
    }

    Err(first_failure.unwrap_or_else(|| diagnose(headers)))
}

fn note(
    strategy: &'static str,
    outcome: StrategyResult,
    first_failure: &mut Option<AuthError>,
) -> Option<AuthUser> {
    match outcome {
        Ok(Some(user)) => {
            tracing::debug!(strategy = strategy, user_id = %user.id, "credential verified");
            Some(user)
        }
        Ok(None) => None,
        Err(err) => {
            tracing::debug!(strategy = strategy, error = %err, "strategy failed");
            if first_failure.is_none() {
                *first_failure = Some(err);
            }
            None
        }
    }
}

/// Token-free session: `X-Session-Id` paired with `X-User-ID`.
async fn verify_token_free(
    headers: &HeaderMap,
    identity: &dyn IdentityProvider,
    now: DateTime<Utc>,
) -> StrategyResult {
    let session_id = header_str(headers, HEADER_SESSION_ID);
    let user_id = header_str(headers, HEADER_USER_ID);
    let (Some(session_id), Some(user_id)) = (session_id, user_id) else {
        return Ok(None);
    };

    if is_demo_flag(headers) {
        let user = demo::synthesize_user(user_id, demo::SESSION_WINDOW_HOURS, now, "token-free")?;
        return Ok(Some(user));
    }

    // No server-side session table exists for real users; the asserted user
    // id is looked up and trusted as-is. See DESIGN.md.
    tracing::debug!(session_id = %session_id, user_id = %user_id, "token-free lookup");
    match identity.get_user_by_id(user_id).await {
        Ok(Some(mut user)) => {
            user.app_metadata
                .insert("tokenFree".to_string(), serde_json::Value::Bool(true));
            Ok(Some(user))
        }
        Ok(None) => Err(AuthError::UnknownUser(user_id.to_string())),
        Err(err) => Err(AuthError::MethodsExhausted(format!(
            "identity lookup failed: {}",
            err
        ))),
    }
}

/// Legacy session: combined `Authorization: Session <id>` header, user id
/// and demo flag in their own headers.
async fn verify_legacy_session(
    headers: &HeaderMap,
    identity: &dyn IdentityProvider,
    now: DateTime<Utc>,
) -> StrategyResult {
    let Some(auth) = header_str(headers, "authorization") else {
        return Ok(None);
    };
    let Some(_session_id) = auth.strip_prefix(SESSION_PREFIX) else {
        return Ok(None);
    };
    let Some(user_id) = header_str(headers, HEADER_USER_ID) else {
        return Err(AuthError::MalformedCredential(
            "Session header present but X-User-ID missing".to_string(),
        ));
    };

    if is_demo_flag(headers) {
        let user = demo::synthesize_user(user_id, demo::SESSION_WINDOW_HOURS, now, "session")?;
        return Ok(Some(user));
    }

    match identity.get_user_by_id(user_id).await {
        Ok(Some(user)) => Ok(Some(user)),
        Ok(None) => Err(AuthError::UnknownUser(user_id.to_string())),
        Err(err) => Err(AuthError::MethodsExhausted(format!(
            "identity lookup failed: {}",
            err
        ))),
    }
}

/// Bearer token: demo-pattern tokens age out at 24h, anything else goes to
/// the identity provider.
async fn verify_bearer(
    headers: &HeaderMap,
    identity: &dyn IdentityProvider,
    now: DateTime<Utc>,
) -> StrategyResult {
    let Some(auth) = header_str(headers, "authorization") else {
        return Ok(None);
    };
    let Some(token) = auth.strip_prefix(BEARER_PREFIX) else {
        return Ok(None);
    };

    if demo::is_demo_token(token) {
        let user = demo::demo_user_from_token(token, demo::TOKEN_WINDOW_HOURS, now)?;
        return Ok(Some(user));
    }

    match identity.verify_token(token).await {
        Ok(Some(user)) => Ok(Some(user)),
        Ok(None) => Err(AuthError::UnknownUser("bearer token".to_string())),
        Err(err) => Err(AuthError::MethodsExhausted(format!(
            "token verification failed: {}",
            err
        ))),
    }
}

/// Last resort: an explicit demo flag plus a demo-pattern user id.
fn verify_demo_marker(headers: &HeaderMap, now: DateTime<Utc>) -> StrategyResult {
    if !is_demo_flag(headers) {
        return Ok(None);
    }
    let Some(user_id) = header_str(headers, HEADER_USER_ID) else {
        return Ok(None);
    };
    if !demo::is_demo_user_id(user_id) {
        return Ok(None);
    }

    let user = demo::synthesize_user(user_id, demo::SESSION_WINDOW_HOURS, now, "demo-marker")?;
    Ok(Some(user))
}

fn diagnose(headers: &HeaderMap) -> AuthError {
    let any_present = ["authorization", HEADER_SESSION_ID, HEADER_USER_ID, HEADER_IS_DEMO]
        .iter()
        .any(|name| headers.contains_key(*name));

    if any_present {
        AuthError::MalformedCredential(
            "authentication headers present but no method could use them".to_string(),
        )
    } else {
        AuthError::MissingCredential(
            "expected Authorization, X-Session-Id with X-User-ID, or X-Is-Demo".to_string(),
        )
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

fn is_demo_flag(headers: &HeaderMap) -> bool {
    header_str(headers, HEADER_IS_DEMO) == Some("true")
}

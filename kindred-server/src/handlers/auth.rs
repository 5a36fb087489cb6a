use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use chrono::Utc;
use kindred_core::{demo, models::StoredSession};
use serde::Deserialize;
use validator::Validate;

use crate::{error::AppError, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub demo: bool,
    pub auth_type: Option<String>,
}

/// Public endpoint. Demo signups mint a synthetic user plus a 24h token
/// pair entirely server-side; real signups delegate to the identity
/// provider.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Response, AppError> {
    req.validate()?;

    if req.demo {
        let now = Utc::now();
        let ts = now.timestamp_millis();
        let user_id = format!("{}{}", demo::DEMO_USER_PREFIX, ts);
        let auth_type = req.auth_type.as_deref().unwrap_or("token-free");

        let user = demo::synthesize_user(&user_id, demo::SESSION_WINDOW_HOURS, now, auth_type)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("demo synthesis failed: {}", e)))?;

        tracing::info!(user_id = %user.id, auth_type = auth_type, "demo signup");

        let session = StoredSession::demo(user, ts, now);
        return Ok((StatusCode::CREATED, Json(session)).into_response());
    }

    let email = req
        .email
        .ok_or_else(|| AppError::BadRequest("email is required for non-demo signup".to_string()))?;

    let user = state
        .identity
        .create_user(&email, req.phone.as_deref())
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(user_id = %user.id, "user created via identity provider");

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "user": user }))).into_response())
}

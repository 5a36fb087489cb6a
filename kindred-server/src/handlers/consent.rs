use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::{error::AppError, middleware::CurrentUser, AppState};

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub kind: String,
    pub granted: bool,
}

#[axum::debug_handler]
pub async fn record_consent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ConsentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.kind.trim().is_empty() {
        return Err(AppError::BadRequest("consent kind must not be empty".to_string()));
    }

    let key = format!("consent:{}:{}", user.id, req.kind);
    let record = serde_json::json!({
        "granted": req.granted,
        "recorded_at": Utc::now(),
    });

    state
        .store
        .set(&key, &record.to_string())
        .await
        .map_err(AppError::Store)?;

    tracing::info!(user_id = %user.id, kind = %req.kind, granted = req.granted, "consent recorded");

    Ok((StatusCode::CREATED, Json(record)))
}

#[axum::debug_handler]
pub async fn request_export(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let key = format!("privacy:export:{}", user.id);
    let record = serde_json::json!({
        "status": "pending",
        "requested_at": Utc::now(),
    });

    state
        .store
        .set(&key, &record.to_string())
        .await
        .map_err(AppError::Store)?;

    tracing::info!(user_id = %user.id, "data export requested");

    Ok((StatusCode::ACCEPTED, Json(record)))
}

#[axum::debug_handler]
pub async fn request_deletion(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let key = format!("privacy:deletion:{}", user.id);
    let record = serde_json::json!({
        "status": "pending",
        "requested_at": Utc::now(),
    });

    state
        .store
        .set(&key, &record.to_string())
        .await
        .map_err(AppError::Store)?;

    tracing::info!(user_id = %user.id, "account deletion requested");

    Ok((StatusCode::ACCEPTED, Json(record)))
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, middleware::CurrentUser, AppState};

#[derive(Debug, Deserialize)]
pub struct AnalyticsEvent {
    pub event: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[axum::debug_handler]
pub async fn log_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AnalyticsEvent>,
) -> Result<impl IntoResponse, AppError> {
    if req.event.trim().is_empty() {
        return Err(AppError::BadRequest("event name must not be empty".to_string()));
    }

    tracing::info!(
        user_id = %user.id,
        event = %req.event,
        properties = %serde_json::Value::Object(req.properties.clone()),
        "analytics event"
    );

    let key = format!("analytics:{}:{}", user.id, Uuid::new_v4());
    let record = serde_json::json!({
        "event": req.event,
        "properties": req.properties,
        "logged_at": Utc::now(),
    });
    state
        .store
        .set(&key, &record.to_string())
        .await
        .map_err(AppError::Store)?;

    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, middleware::CurrentUser, models::ChatMessage, AppState};

/// Both participants read and write the same thread regardless of
/// direction, so the key orders the pair lexicographically.
fn thread_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("chat:{}:{}", a, b)
    } else {
        format!("chat:{}:{}", b, a)
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub peer: String,
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.body.trim().is_empty() {
        return Err(AppError::BadRequest("message body must not be empty".to_string()));
    }
    if req.to == user.id {
        return Err(AppError::BadRequest("cannot message yourself".to_string()));
    }

    let key = thread_key(&user.id, &req.to);
    let mut thread = load_thread(&state, &key).await?;

    let message = ChatMessage {
        id: Uuid::new_v4().to_string(),
        from: user.id.clone(),
        to: req.to,
        body: req.body,
        sent_at: Utc::now(),
    };
    thread.push(message.clone());

    let serialized = serde_json::to_string(&thread)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("thread serialization failed: {}", e)))?;
    state
        .store
        .set(&key, &serialized)
        .await
        .map_err(AppError::Store)?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[axum::debug_handler]
pub async fn get_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let key = thread_key(&user.id, &query.peer);
    let thread = load_thread(&state, &key).await?;

    Ok(Json(serde_json::json!({ "messages": thread })))
}

async fn load_thread(state: &AppState, key: &str) -> Result<Vec<ChatMessage>, AppError> {
    let raw = state.store.get(key).await.map_err(AppError::Store)?;
    match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("stored thread is corrupt: {}", e))),
        None => Ok(Vec::new()),
    }
}

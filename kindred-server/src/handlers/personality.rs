use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;

use crate::{error::AppError, middleware::CurrentUser, models::PersonalityResult, AppState};

fn personality_key(user_id: &str) -> String {
    format!("personality:{}", user_id)
}

#[derive(Debug, Deserialize)]
pub struct SaveResultsRequest {
    pub archetype: String,
    #[serde(default)]
    pub trait_scores: HashMap<String, i32>,
}

#[axum::debug_handler]
pub async fn save_results(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SaveResultsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.archetype.trim().is_empty() {
        return Err(AppError::BadRequest("archetype must not be empty".to_string()));
    }

    let result = PersonalityResult {
        archetype: req.archetype,
        trait_scores: req.trait_scores,
        completed_at: Utc::now(),
    };

    let serialized = serde_json::to_string(&result).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("personality serialization failed: {}", e))
    })?;
    state
        .store
        .set(&personality_key(&user.id), &serialized)
        .await
        .map_err(AppError::Store)?;

    tracing::info!(user_id = %user.id, archetype = %result.archetype, "personality results saved");

    Ok((StatusCode::CREATED, Json(result)))
}

#[axum::debug_handler]
pub async fn get_results(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let raw = state
        .store
        .get(&personality_key(&user.id))
        .await
        .map_err(AppError::Store)?
        .ok_or_else(|| AppError::NotFound("Personality results not found".to_string()))?;

    let result: PersonalityResult = serde_json::from_str(&raw).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("stored personality result is corrupt: {}", e))
    })?;

    Ok(Json(result))
}

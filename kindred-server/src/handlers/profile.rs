use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{Lifestyle, Profile},
    AppState,
};

fn profile_key(user_id: &str) -> String {
    format!("profile:{}", user_id)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, max = 80, message = "Display name must be 1-80 characters"))]
    pub display_name: String,
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub lifestyle: Lifestyle,
}

#[axum::debug_handler]
pub async fn create_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let profile = Profile {
        user_id: user.id.clone(),
        display_name: req.display_name,
        bio: req.bio,
        interests: req.interests,
        lifestyle: req.lifestyle,
        created_at: Utc::now(),
    };

    let serialized = serde_json::to_string(&profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("profile serialization failed: {}", e)))?;
    state
        .store
        .set(&profile_key(&user.id), &serialized)
        .await
        .map_err(AppError::Store)?;

    tracing::info!(user_id = %user.id, "profile created");

    Ok((StatusCode::CREATED, Json(profile)))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let raw = state
        .store
        .get(&profile_key(&user.id))
        .await
        .map_err(AppError::Store)?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let profile: Profile = serde_json::from_str(&raw)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored profile is corrupt: {}", e)))?;

    Ok(Json(profile))
}

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{PersonalityResult, Profile},
    services::matching::{compatibility, CompatibilityScore},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct MatchCandidate {
    pub user_id: String,
    pub display_name: String,
    pub shared_interests: Vec<String>,
    pub score: CompatibilityScore,
}

/// Score every other profiled user against the caller, best first.
/// Candidates without personality results are skipped rather than failing
/// the whole listing.
#[axum::debug_handler]
pub async fn get_matches(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let my_profile = load_profile(&state, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Create a profile before requesting matches".to_string()))?;
    let my_personality = load_personality(&state, &user.id).await?.ok_or_else(|| {
        AppError::NotFound("Complete the personality assessment before requesting matches".to_string())
    })?;

    let entries = state
        .store
        .scan_prefix("profile:")
        .await
        .map_err(AppError::Store)?;

    let mut matches = Vec::new();
    for (key, raw) in entries {
        let candidate: Profile = match serde_json::from_str(&raw) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "skipping corrupt profile");
                continue;
            }
        };
        if candidate.user_id == user.id {
            continue;
        }

        let Some(candidate_personality) = load_personality(&state, &candidate.user_id).await?
        else {
            continue;
        };

        let score = compatibility(
            &my_personality,
            &candidate_personality,
            &my_profile,
            &candidate,
        );
        let shared_interests = my_profile
            .interests
            .iter()
            .filter(|i| candidate.interests.contains(i))
            .cloned()
            .collect();

        matches.push(MatchCandidate {
            user_id: candidate.user_id,
            display_name: candidate.display_name,
            shared_interests,
            score,
        });
    }

    matches.sort_by(|a, b| b.score.overall.cmp(&a.score.overall));

    Ok(Json(serde_json::json!({ "matches": matches })))
}

async fn load_profile(state: &AppState, user_id: &str) -> Result<Option<Profile>, AppError> {
    let raw = state
        .store
        .get(&format!("profile:{}", user_id))
        .await
        .map_err(AppError::Store)?;
    match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("stored profile is corrupt: {}", e))),
        None => Ok(None),
    }
}

async fn load_personality(
    state: &AppState,
    user_id: &str,
) -> Result<Option<PersonalityResult>, AppError> {
    let raw = state
        .store
        .get(&format!("personality:{}", user_id))
        .await
        .map_err(AppError::Store)?;
    match raw {
        Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("stored personality result is corrupt: {}", e))
        }),
        None => Ok(None),
    }
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::{error::AppError, middleware::CurrentUser, AppState};

/// Rotating community prompts; the question of the day is picked by date,
/// so every user sees the same one.
const DAILY_QUESTIONS: &[&str] = &[
    "What small thing made you smile today?",
    "Which place would you go back to in a heartbeat?",
    "What's a skill you'd love to learn together with someone?",
    "What does a perfect lazy Sunday look like for you?",
    "Which song always lifts your mood?",
    "What's the best meal you've ever cooked or eaten?",
    "What are you most curious about lately?",
];

#[axum::debug_handler]
pub async fn daily_question(CurrentUser(_user): CurrentUser) -> impl IntoResponse {
    let today = Utc::now().date_naive();
    let index = today.num_days_from_ce().rem_euclid(DAILY_QUESTIONS.len() as i32) as usize;

    Json(serde_json::json!({
        "date": today.to_string(),
        "question": DAILY_QUESTIONS[index],
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[axum::debug_handler]
pub async fn answer_daily_question(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.answer.trim().is_empty() {
        return Err(AppError::BadRequest("answer must not be empty".to_string()));
    }

    let today = Utc::now().date_naive();
    let key = format!("answer:{}:{}", today, user.id);
    let record = serde_json::json!({
        "answer": req.answer,
        "answered_at": Utc::now(),
    });

    state
        .store
        .set(&key, &record.to_string())
        .await
        .map_err(AppError::Store)?;

    Ok((StatusCode::CREATED, Json(record)))
}

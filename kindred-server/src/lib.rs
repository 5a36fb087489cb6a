pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::services::{IdentityProvider, KeyValueStore};

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn KeyValueStore>,
}

pub fn build_router(state: AppState) -> Router {
    // Everything except signup and health sits behind the verification
    // cascade.
    let protected = Router::new()
        .route(
            "/profile",
            post(handlers::profile::create_profile).get(handlers::profile::get_profile),
        )
        .route(
            "/personality/results",
            post(handlers::personality::save_results).get(handlers::personality::get_results),
        )
        .route("/matches", get(handlers::matches::get_matches))
        .route(
            "/chat/messages",
            post(handlers::chat::send_message).get(handlers::chat::get_history),
        )
        .route(
            "/community/daily-question",
            get(handlers::community::daily_question),
        )
        .route(
            "/community/daily-question/answer",
            post(handlers::community::answer_daily_question),
        )
        .route("/consent", post(handlers::consent::record_consent))
        .route("/privacy/export", post(handlers::consent::request_export))
        .route(
            "/privacy/deletion",
            post(handlers::consent::request_deletion),
        )
        .route("/analytics/events", post(handlers::analytics::log_event))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(handlers::auth::signup))
        .merge(protected)
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(middleware::tracing::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|origin| {
                            origin
                                .parse::<axum::http::HeaderValue>()
                                .map_err(|e| {
                                    tracing::error!("Invalid CORS origin '{}': {}", origin, e);
                                    e
                                })
                                .ok()
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::HeaderName::from_static("x-session-id"),
                    axum::http::header::HeaderName::from_static("x-user-id"),
                    axum::http::header::HeaderName::from_static("x-is-demo"),
                    axum::http::header::HeaderName::from_static("x-api-key"),
                    axum::http::header::HeaderName::from_static("x-request-id"),
                ]),
        )
}

/// Service health check. Public, never requires credentials.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "store health check failed");
        AppError::Internal(e)
    })?;

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}

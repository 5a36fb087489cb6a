mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use kindred_core::demo;
use kindred_server::middleware::{auth_middleware, CurrentUser};
use tower::util::ServiceExt;

use common::test_state;

async fn me(CurrentUser(user): CurrentUser) -> Json<kindred_core::AuthUser> {
    Json(user)
}

/// Probe router: one route that echoes the verified user.
fn probe_app() -> Router {
    let (state, _identity) = test_state();
    Router::new()
        .route("/me", get(me))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_headers_rejected() {
    let response = probe_app()
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("no authentication"));
}

#[tokio::test]
async fn test_token_free_demo_end_to_end() {
    let now = Utc::now();
    let ts = now.timestamp_millis() - 1000;
    let user_id = format!("{}{}", demo::DEMO_USER_PREFIX, ts);

    let response = probe_app()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("X-Session-Id", "abc")
                .header("X-User-ID", &user_id)
                .header("X-Is-Demo", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"].as_str().unwrap(), user_id);
    assert_eq!(
        body["email"].as_str().unwrap(),
        format!("demo{}@{}", ts, demo::DEMO_EMAIL_DOMAIN)
    );
}

#[tokio::test]
async fn test_expired_demo_session_rejected() {
    let now = Utc::now();
    let ts = (now - Duration::hours(49)).timestamp_millis();

    let response = probe_app()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("X-Session-Id", "abc")
                .header("X-User-ID", format!("{}{}", demo::DEMO_USER_PREFIX, ts))
                .header("X-Is-Demo", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn test_bearer_window_asymmetry_over_http() {
    // Same 30h-old timestamp: session headers pass, bearer token fails.
    let now = Utc::now();
    let ts = (now - Duration::hours(30)).timestamp_millis();

    let response = probe_app()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("X-Session-Id", "abc")
                .header("X-User-ID", format!("{}{}", demo::DEMO_USER_PREFIX, ts))
                .header("X-Is-Demo", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = probe_app()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(
                    "Authorization",
                    format!("Bearer {}{}", demo::DEMO_TOKEN_PREFIX, ts),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_legacy_session_header() {
    let now = Utc::now();
    let ts = now.timestamp_millis();
    let user_id = format!("{}{}", demo::DEMO_USER_PREFIX, ts);

    let response = probe_app()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("Authorization", "Session legacy-session-1")
                .header("X-User-ID", &user_id)
                .header("X-Is-Demo", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"].as_str().unwrap(), user_id);
}

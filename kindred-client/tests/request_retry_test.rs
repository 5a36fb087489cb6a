mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{Duration, Utc};
use kindred_client::{
    ApiClient, ClientConfig, ClientError, MemorySessionStore, MockSessionProvider, TokenManager,
    MAX_RETRIES,
};
use kindred_core::{demo, StoredSession};
use serde_json::json;

use common::spawn_server;

fn demo_session_aged(hours: i64) -> StoredSession {
    let now = Utc::now();
    let ts = (now - Duration::hours(hours)).timestamp_millis();
    let user = demo::synthesize_user(
        &format!("{}{}", demo::DEMO_USER_PREFIX, ts),
        demo::SESSION_WINDOW_HOURS,
        now,
        "token-free",
    )
    .unwrap();
    StoredSession::demo(user, ts, now)
}

fn client_against(
    base_url: &str,
    sessions: Arc<MemorySessionStore>,
) -> (ApiClient, Arc<TokenManager>) {
    let tokens = Arc::new(TokenManager::new());
    let client = ApiClient::new(
        ClientConfig::new(base_url, "test-anon-key"),
        tokens.clone(),
        sessions,
        Arc::new(MockSessionProvider::new()),
    )
    .unwrap();
    (client, tokens)
}

async fn always_401(State(calls): State<Arc<AtomicU32>>) -> (StatusCode, Json<serde_json::Value>) {
    calls.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "credentials rejected" })),
    )
}

#[tokio::test]
async fn test_persistent_401_is_bounded_by_retry_cap() {
    let calls = Arc::new(AtomicU32::new(0));
    let router = Router::new()
        .route("/matches", get(always_401))
        .with_state(calls.clone());
    let base_url = spawn_server(router).await;

    // Recovery always succeeds (fresh backup), so every allowed retry is
    // actually taken.
    let sessions = Arc::new(MemorySessionStore::with_session(demo_session_aged(1)));
    let (client, tokens) = client_against(&base_url, sessions);
    tokens.set_access_token(Some(demo_session_aged(1).access_token));

    let result = client.get_matches().await;

    assert!(matches!(result, Err(ClientError::Unauthenticated(_))));
    assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES + 1);
}

#[tokio::test]
async fn test_single_401_recovers_and_retries_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let router = Router::new()
        .route(
            "/profile",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "error": "credentials rejected" })),
                        )
                    } else {
                        (StatusCode::OK, Json(json!({ "display_name": "Sam" })))
                    }
                }
            }),
        )
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }));
    let base_url = spawn_server(router).await;

    let sessions = Arc::new(MemorySessionStore::with_session(demo_session_aged(1)));
    let (client, tokens) = client_against(&base_url, sessions);
    tokens.set_access_token(Some(demo_session_aged(2).access_token));

    let profile = client.get_profile().await.unwrap();

    assert_eq!(profile["display_name"], "Sam");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_server_errors_do_not_trigger_recovery() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let router = Router::new().route(
        "/matches",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "upstream down" })),
                )
            }
        }),
    );
    let base_url = spawn_server(router).await;

    let sessions = Arc::new(MemorySessionStore::with_session(demo_session_aged(1)));
    let (client, tokens) = client_against(&base_url, sessions);
    tokens.set_access_token(Some(demo_session_aged(2).access_token));

    let result = client.get_matches().await;

    assert!(matches!(result, Err(ClientError::Server { status: 502 })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_token_with_no_recovery_sources() {
    // Nothing in memory, no backup, no provider session: typed NoToken
    // error without ever touching the network.
    let sessions = Arc::new(MemorySessionStore::new());
    let (client, _tokens) = client_against("http://127.0.0.1:1", sessions);

    let result = client.get_profile().await;

    assert!(matches!(result, Err(ClientError::NoToken(_))));
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    let sessions = Arc::new(MemorySessionStore::new());
    let (client, tokens) = client_against("http://127.0.0.1:1", sessions);
    tokens.set_access_token(Some(demo_session_aged(1).access_token));

    let result = client.get_matches().await;

    assert!(matches!(result, Err(ClientError::Network(_))));
}

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use kindred_server::build_router;
use serde_json::json;
use tower::util::ServiceExt;

use common::test_state;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (state, _identity) = test_state();
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_demo_signup_then_profile_roundtrip() {
    let (state, _identity) = test_state();
    let app = build_router(state);

    // 1. Demo signup, no credentials required
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({ "demo": true, "auth_type": "token-free" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let session = body_json(response).await;
    let token = session["access_token"].as_str().unwrap().to_string();
    assert!(token.starts_with("demo-token-"));
    assert_eq!(session["expires_in"].as_i64().unwrap(), 86_400);
    assert_eq!(session["token_type"], "bearer");
    let user_id = session["user"]["id"].as_str().unwrap().to_string();
    assert!(user_id.starts_with("demo-user-"));

    // 2. Profile does not exist yet
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/profile")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // 3. Create it with the issued token
    let response = app
        .clone()
        .oneshot({
            let mut req = json_request(
                "POST",
                "/profile",
                json!({
                    "display_name": "Sam",
                    "interests": ["hiking", "films"],
                    "lifestyle": { "alcohol": "socially" }
                }),
            );
            req.headers_mut().insert(
                "authorization",
                format!("Bearer {}", token).parse().unwrap(),
            );
            req
        })
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // 4. Read it back
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/profile")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["user_id"].as_str().unwrap(), user_id);
    assert_eq!(profile["display_name"], "Sam");
}

#[tokio::test]
async fn test_matches_scored_and_sorted() {
    let (state, _identity) = test_state();
    let app = build_router(state);

    // Three demo users: signup, profile, personality each.
    let mut tokens = Vec::new();
    for (name, archetype, interests) in [
        ("Ada", "dreamer", json!(["hiking", "films"])),
        ("Ben", "anchor", json!(["hiking", "films"])),
        ("Cy", "spark", json!(["pottery"])),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/auth/signup", json!({ "demo": true })))
            .await
            .unwrap();
        let session = body_json(response).await;
        let token = session["access_token"].as_str().unwrap().to_string();

        let mut req = json_request(
            "POST",
            "/profile",
            json!({
                "display_name": name,
                "interests": interests,
                "lifestyle": { "alcohol": "never" }
            }),
        );
        req.headers_mut().insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let mut req = json_request(
            "POST",
            "/personality/results",
            json!({ "archetype": archetype }),
        );
        req.headers_mut().insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        tokens.push(token);

        // Demo ids are minted from the current millisecond; space signups
        // out so each user gets a distinct id.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    // Ada asks for matches: Ben (dreamer/anchor = 100, identical interests)
    // must outrank Cy.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/matches")
                .header("Authorization", format!("Bearer {}", tokens[0]))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["display_name"], "Ben");
    assert_eq!(matches[0]["score"]["overall"].as_u64().unwrap(), 98);
    assert!(
        matches[0]["score"]["overall"].as_u64().unwrap()
            >= matches[1]["score"]["overall"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn test_bad_signup_body_is_400() {
    let (state, _identity) = test_state();
    let app = build_router(state);

    // Non-demo signup without an email
    let response = app
        .oneshot(json_request("POST", "/auth/signup", json!({ "demo": false })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("email"));
}

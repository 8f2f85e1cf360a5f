//! Bearer token handling on the protected song routes.

mod helpers;

use axum::http::StatusCode;
use cloudbeat_api::auth::SharedSecretVerifier;
use helpers::auth::{bearer, mint, token_for, TEST_SIGNING_KEY};
use helpers::{setup_test_app, setup_test_app_with_verifier};
use serde_json::{json, Value};
use std::sync::Arc;

fn error_message(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_missing_header_is_rejected() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/songs").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(error_message(&body), "Authorization token is missing");
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_wrong_scheme_is_treated_as_missing() {
    let app = setup_test_app().await;

    for header in [
        format!("Basic {}", token_for("u-1")),
        "Bearer".to_string(),
        format!("Bearer {} extra", token_for("u-1")),
    ] {
        let response = app
            .client()
            .get("/api/songs")
            .add_header("Authorization", header)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            error_message(&response.json()),
            "Authorization token is missing"
        );
    }
}

#[tokio::test]
async fn test_scheme_is_case_insensitive() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/songs")
        .add_header("Authorization", format!("bearer {}", token_for("u-1")))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_malformed_token_is_invalid() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/songs")
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&response.json()), "Invalid token");
}

#[tokio::test]
async fn test_expired_token() {
    let app = setup_test_app().await;
    let token = mint(json!({
        "sub": "u-1",
        "exp": chrono::Utc::now().timestamp() - 60,
    }));

    let response = app
        .client()
        .get("/api/songs")
        .add_header("Authorization", format!("Bearer {}", token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&response.json()), "Token expired");
}

#[tokio::test]
async fn test_token_without_subject_is_invalid() {
    let app = setup_test_app().await;
    let token = mint(json!({ "exp": chrono::Utc::now().timestamp() + 600 }));

    let response = app
        .client()
        .get("/api/songs")
        .add_header("Authorization", format!("Bearer {}", token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&response.json()), "Invalid token");
}

#[tokio::test]
async fn test_signature_is_not_checked_by_default() {
    let app = setup_test_app().await;
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({ "sub": "u-1", "exp": chrono::Utc::now().timestamp() + 600 }),
        &jsonwebtoken::EncodingKey::from_secret(b"some-other-key"),
    )
    .unwrap();

    let response = app
        .client()
        .get("/api/songs")
        .add_header("Authorization", format!("Bearer {}", forged))
        .await;
    response.assert_status_ok();
    let songs: Vec<Value> = response.json();
    assert!(songs.is_empty());
}

#[tokio::test]
async fn test_shared_secret_verifier_rejects_foreign_signature() {
    let app = setup_test_app_with_verifier(Arc::new(SharedSecretVerifier::new(
        "a-completely-different-secret",
    )))
    .await;

    let response = app
        .client()
        .get("/api/songs")
        .add_header("Authorization", bearer("u-1"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&response.json()), "Invalid token");
}

#[tokio::test]
async fn test_shared_secret_verifier_accepts_own_signature() {
    let app =
        setup_test_app_with_verifier(Arc::new(SharedSecretVerifier::new(TEST_SIGNING_KEY))).await;

    let response = app
        .client()
        .get("/api/songs/")
        .add_header("Authorization", bearer("u-1"))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_unauthenticated_body_shape() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/songs").await;
    let body: Value = response.json();
    assert_eq!(body["recoverable"], false);
    assert!(body["suggested_action"].is_string());
}

mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use qrfood_backend::services::email::SentMailKind;
use qrfood_backend::store::AuthStore;
use serde_json::json;

#[tokio::test]
async fn test_reset_flow_changes_the_stored_hash() {
    let app = TestApp::spawn();
    let user = app.seed_user("reset@example.com", "old-password-1", &[]).await;
    let old_hash = user.password_hash.clone().unwrap();

    let response = app
        .post_json(
            "/api/auth/password-reset/request",
            json!({"email": "reset@example.com"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, SentMailKind::PasswordReset);

    let response = app
        .post_json(
            "/api/auth/password-reset/complete",
            json!({"token": sent[0].raw_token, "newPassword": "new-password-9"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let updated = app.store.find_user_by_id(user.id).await.unwrap().unwrap();
    assert_ne!(updated.password_hash.unwrap(), old_hash);

    // Old credential dead, new one works
    let response = app
        .post_json(
            "/api/auth/login",
            json!({"email": "reset@example.com", "password": "old-password-1"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/api/auth/login",
            json!({"email": "reset@example.com", "password": "new-password-9"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reset_request_for_unknown_email_is_silent() {
    let app = TestApp::spawn();

    let response = app
        .post_json(
            "/api/auth/password-reset/request",
            json!({"email": "ghost@example.com"}),
        )
        .await;

    // Same answer as for a known address; nothing mailed, nothing created
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);
    assert!(app.mailer.sent().is_empty());
    assert!(app
        .store
        .find_user_by_email("ghost@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let app = TestApp::spawn();
    app.seed_user("reset@example.com", "old-password-1", &[]).await;

    app.post_json(
        "/api/auth/password-reset/request",
        json!({"email": "reset@example.com"}),
    )
    .await;
    let raw = app.mailer.sent()[0].raw_token.clone();

    let first = app
        .post_json(
            "/api/auth/password-reset/complete",
            json!({"token": raw, "newPassword": "new-password-9"}),
        )
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .post_json(
            "/api/auth/password-reset/complete",
            json!({"token": raw, "newPassword": "another-pass-3"}),
        )
        .await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_magic_link_token_rejected_and_burned_by_reset_endpoint() {
    let app = TestApp::spawn();
    app.seed_user("mixed@example.com", "old-password-1", &[]).await;

    app.post_json("/api/auth/magic-link", json!({"email": "mixed@example.com"}))
        .await;
    let raw = app.mailer.sent()[0].raw_token.clone();

    // Wrong kind: rejected with 400, and the secret is spent
    let response = app
        .post_json(
            "/api/auth/password-reset/complete",
            json!({"token": raw, "newPassword": "new-password-9"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Token kind mismatch");

    let retry = app
        .post_json("/api/auth/verify-token", json!({"token": raw}))
        .await;
    assert_eq!(retry.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_complete_rejects_short_password() {
    let app = TestApp::spawn();

    let response = app
        .post_json(
            "/api/auth/password-reset/complete",
            json!({"token": "whatever", "newPassword": "short"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

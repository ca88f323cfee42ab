mod common;

use axum::http::StatusCode;
use common::{body_json, set_cookie_header, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_login_returns_token_and_refresh_cookie() {
    let app = TestApp::spawn();
    app.seed_user("owner@example.com", "pass-word-1", &["EATERY_ADMIN"])
        .await;

    let response = app
        .post_json(
            "/api/auth/login",
            json!({"email": "owner@example.com", "password": "pass-word-1"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie_header(&response).expect("refresh cookie");
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Path=/"));

    let body = body_json(response).await;
    assert_eq!(body["username"], "owner@example.com");
    assert_eq!(body["roles"], json!(["EATERY_ADMIN"]));

    // The returned access token decodes with the service key
    let claims = app.jwt.decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, "owner@example.com");
    assert_eq!(claims.user_id, body["principalId"].as_i64().unwrap());
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let app = TestApp::spawn();
    app.seed_user("owner@example.com", "pass-word-1", &[]).await;

    let response = app
        .post_json(
            "/api/auth/login",
            json!({"email": "owner@example.com", "password": "wrong"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Password or user name invalid");
}

#[tokio::test]
async fn test_login_unknown_email_same_error_as_wrong_password() {
    let app = TestApp::spawn();

    let response = app
        .post_json(
            "/api/auth/login",
            json!({"email": "nobody@example.com", "password": "whatever"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Password or user name invalid");
}

#[tokio::test]
async fn test_requested_tenant_kept_for_member() {
    let app = TestApp::spawn();
    let user = app.seed_user("member@example.com", "pass-word-1", &[]).await;
    app.store.add_membership(user.id, 7, "WAITER").unwrap();
    app.store.add_membership(user.id, 9, "WAITER").unwrap();

    let body = app.login("member@example.com", "pass-word-1", Some(9)).await;
    assert_eq!(body["eateryId"], 9);

    let claims = app.jwt.decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.eatery_id, Some(9));
}

#[tokio::test]
async fn test_non_member_tenant_request_degrades_to_null() {
    let app = TestApp::spawn();
    let user = app.seed_user("eve@example.com", "pass-word-1", &[]).await;
    app.store.add_membership(user.id, 7, "WAITER").unwrap();
    app.store.add_membership(user.id, 9, "WAITER").unwrap();

    // Requesting a tenant outside the membership set still logs in,
    // but the session carries no tenant at all
    let body = app.login("eve@example.com", "pass-word-1", Some(12)).await;
    assert!(body.get("eateryId").is_none());

    let claims = app.jwt.decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.eatery_id, None);
}

#[tokio::test]
async fn test_sole_membership_is_default_tenant() {
    let app = TestApp::spawn();
    let user = app.seed_user("solo@example.com", "pass-word-1", &[]).await;
    app.store.add_membership(user.id, 4, "EATERY_ADMIN").unwrap();

    let body = app.login("solo@example.com", "pass-word-1", None).await;
    assert_eq!(body["eateryId"], 4);
}

#[tokio::test]
async fn test_login_validates_body() {
    let app = TestApp::spawn();

    let response = app
        .post_json(
            "/api/auth/login",
            json!({"email": "not-an-email", "password": "x"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

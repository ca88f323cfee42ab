mod common;

use axum::http::StatusCode;
use common::{body_json, set_cookie_header, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_anonymous_status() {
    let app = TestApp::spawn();

    let response = app.get("/api/auth/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body, json!({"authenticated": false}));
}

#[tokio::test]
async fn test_authenticated_status_reports_principal() {
    let app = TestApp::spawn();
    let user = app
        .seed_user("status@example.com", "pass-word-1", &["KITCHEN_ADMIN"])
        .await;
    app.store.add_membership(user.id, 3, "KITCHEN_ADMIN").unwrap();
    app.store.add_membership(user.id, 5, "KITCHEN_ADMIN").unwrap();

    let login = app.login("status@example.com", "pass-word-1", Some(3)).await;
    let token = login["token"].as_str().unwrap();

    let response = app.get_authed("/api/auth/status", token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["principalId"].as_i64().unwrap(), user.id);
    assert_eq!(body["username"], "status@example.com");
    assert_eq!(body["roles"], json!(["KITCHEN_ADMIN"]));
    assert_eq!(body["eateryIds"], json!([3, 5]));
    assert!(body["lastLogin"].is_string());
}

#[tokio::test]
async fn test_status_with_invalid_token_is_unauthorized() {
    let app = TestApp::spawn();

    // Token shaped right but signed elsewhere
    let response = app
        .get_authed("/api/auth/status", "eyJhbGciOiJIUzI1NiJ9.e30.bad")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_deletes_refresh_token_and_expires_cookie() {
    let app = TestApp::spawn();
    app.seed_user("bye@example.com", "pass-word-1", &[]).await;

    let login_response = app
        .post_json(
            "/api/auth/login",
            json!({"email": "bye@example.com", "password": "pass-word-1"}),
        )
        .await;
    let refresh = set_cookie_header(&login_response)
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .strip_prefix("refreshToken=")
        .unwrap()
        .to_string();
    let token = body_json(login_response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .post_json_authed("/api/auth/logout", &token, json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    // Refresh row is gone, so the exchange fails
    let exchange = app
        .post_json("/api/auth/refresh-token", json!({"refreshToken": refresh}))
        .await;
    assert_eq!(exchange.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_requires_authentication() {
    let app = TestApp::spawn();

    let response = app.post_json("/api/auth/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::spawn();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

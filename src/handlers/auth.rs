//! Auth endpoints. Thin layer over the orchestrator: handlers validate
//! input, delegate, and manage the refresh cookie.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::dtos::auth::{
    GoogleLoginRequest, LoginRequest, LoginResponse, MagicLinkRequest, PasswordResetComplete,
    PasswordResetRequest, RefreshRequest, RefreshTokenRequest, StatusResponse, SuccessResponse,
    TokenResponse, VerifyTokenRequest,
};
use crate::error::AppError;
use crate::middleware::auth::MaybeUser;
use crate::middleware::CurrentUser;
use crate::services::LoginOutcome;
use crate::utils::validation::ValidatedJson;
use crate::AppState;

const REFRESH_COOKIE: &str = "refreshToken";

fn refresh_cookie(value: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

fn login_response(
    state: &AppState,
    jar: CookieJar,
    outcome: LoginOutcome,
) -> (CookieJar, Json<LoginResponse>) {
    let jar = jar.add(refresh_cookie(
        outcome.refresh_token,
        state.auth.refresh_cookie_max_age_seconds(),
    ));
    (jar, Json(outcome.response))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let outcome = state.auth.password_login(req).await?;
    Ok(login_response(&state, jar, outcome))
}

pub async fn magic_link(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<MagicLinkRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.auth.request_magic_link(&req.email).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn verify_token(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<VerifyTokenRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let outcome = state.auth.verify_magic_link(&req.token).await?;
    Ok(login_response(&state, jar, outcome))
}

pub async fn google_oauth(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<GoogleLoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let outcome = state.auth.google_login(&req.id_token).await?;
    Ok(login_response(&state, jar, outcome))
}

pub async fn password_reset_request(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.auth.request_password_reset(&req.email).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn password_reset_complete(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetComplete>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .auth
        .complete_password_reset(&req.token, &req.new_password)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Re-scope the caller's session to another eatery.
pub async fn refresh(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = state.auth.switch_tenant(&claims, req.eatery_id).await?;
    Ok(Json(response))
}

/// Exchange the opaque refresh token for a fresh access token.
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = state.auth.exchange_refresh_token(&req.refresh_token).await?;
    Ok(Json(response))
}

pub async fn status(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
) -> Result<Json<StatusResponse>, AppError> {
    let response = state.auth.status(claims.as_ref()).await?;
    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SuccessResponse>), AppError> {
    state.auth.logout(&claims).await?;
    // Expire the cookie; the client discards the access token itself
    let jar = jar.remove(Cookie::build((REFRESH_COOKIE, "")).path("/").build());
    Ok((jar, Json(SuccessResponse { success: true })))
}

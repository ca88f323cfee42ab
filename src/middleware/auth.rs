//! Bearer authentication.
//!
//! Identity is request-scoped extension data only; there is no shared
//! mutable security context.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::AccessClaims;
use crate::AppState;

/// Decode a bearer token once per request and stash the claims.
///
/// A missing header leaves the request anonymous; a present but
/// invalid or expired token is fatal for the request.
pub async fn authenticate_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        let claims = state.jwt.decode(token)?;
        req.extensions_mut().insert(claims);
    }

    Ok(next.run(req).await)
}

/// Extractor for handlers that require an authenticated caller.
pub struct CurrentUser(pub AccessClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))
    }
}

/// Extractor yielding the claims when present, without rejecting
/// anonymous callers.
pub struct MaybeUser(pub Option<AccessClaims>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AccessClaims>().cloned()))
    }
}

//! Tenant gatekeeper.
//!
//! For any path that names an eatery, an authenticated caller's token
//! must be scoped to that same eatery. Rejection is terminal for the
//! current request only.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::services::AccessClaims;

/// Compare the token tenant against the eatery id in the path.
///
/// Anonymous requests pass through; routes that need identity reject
/// them separately. Runs after `authenticate_middleware`.
pub async fn eatery_guard_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    if let Some(path_eatery_id) = extract_path_eatery_id(req.uri().path()) {
        if let Some(claims) = req.extensions().get::<AccessClaims>() {
            match claims.eatery_id {
                None => {
                    tracing::warn!(
                        user_id = claims.user_id,
                        path_eatery_id,
                        "Token carries no eatery scope"
                    );
                    return Err(AppError::EateryIdMissing);
                }
                Some(token_eatery_id) if token_eatery_id != path_eatery_id => {
                    tracing::warn!(
                        user_id = claims.user_id,
                        token_eatery_id,
                        path_eatery_id,
                        "Token eatery does not match path"
                    );
                    return Err(AppError::EateryMismatch);
                }
                Some(_) => {}
            }
        }
    }

    Ok(next.run(req).await)
}

/// Pull the eatery id out of the paths that carry one:
/// `/api/eatery/{id}/...`, `/api/eateries/{id}...` and
/// `/api/users/eatery/{id}`.
pub fn extract_path_eatery_id(path: &str) -> Option<i64> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["api", "eatery", id, ..] | ["api", "eateries", id, ..] => id.parse().ok(),
        ["api", "users", "eatery", id, ..] => id.parse().ok(),
        _ => None,
    }
}

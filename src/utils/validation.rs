//! JSON extractor that runs `validator` rules before a handler sees the
//! body. Malformed JSON is a 400; rule violations are a 422.

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::dtos::ErrorResponse;

pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Malformed request body: {}", e)))?;

        body.validate()
            .map_err(|e| reject(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid request: {}", e)))?;

        Ok(ValidatedJson(body))
    }
}

fn reject(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

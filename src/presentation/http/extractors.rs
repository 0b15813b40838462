// src/presentation/http/extractors.rs
use crate::application::{dto::JwtToken, error::ApplicationError};
use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::HttpError;

/// Verified bearer token placed in the request by the bearer middleware.
#[derive(Debug, Clone)]
pub struct BearerToken(pub JwtToken);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<BearerToken>().cloned().ok_or_else(|| {
            HttpError::from_error(ApplicationError::unauthorized(
                "a valid bearer token is required",
            ))
        })
    }
}

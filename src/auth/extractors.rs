use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::{claims::Claims, services::AuthService};
use crate::error::ApiError;

pub const INVALID_FORMAT: &str = "Invalid request format";

/// JSON body that rejects with `400 {"message": "Invalid request format"}`.
/// An empty body deserializes as `T::default()`.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "failed to read request body");
            ApiError::bad_request(INVALID_FORMAT)
        })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ValidJson(T::default()));
        }

        serde_json::from_slice(&body).map(ValidJson).map_err(|e| {
            warn!(error = %e, "malformed json body");
            ApiError::bad_request(INVALID_FORMAT)
        })
    }
}

/// Verified session token claims from `Authorization: Bearer <token>`.
pub struct AuthClaims(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthService::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        let claims = auth.verify_token(token).map_err(|e| {
            warn!(error = %e, "rejected session token");
            ApiError::unauthorized("Unauthorized")
        })?;

        Ok(AuthClaims(claims))
    }
}

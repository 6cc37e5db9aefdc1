use axum::{routing::post, Router};
use tracing::{info, instrument};

use crate::{auth::extractors::AuthClaims, error::ApiError, state::AppState};

pub fn pvz_routes() -> Router<AppState> {
    Router::new().route("/pvz", post(create_pvz))
}

/// Pickup-point creation has no defined contract yet; callers must still
/// present a valid session token.
#[instrument(skip_all)]
pub async fn create_pvz(AuthClaims(claims): AuthClaims) -> ApiError {
    info!(role = %claims.role, "pvz creation requested");
    ApiError::NotImplemented("Not implemented".into())
}

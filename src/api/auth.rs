use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::api::ApiError;
use crate::cli::RateDeskApp;
use crate::error::RateDeskError;

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn key_fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digests are compared so the check does not depend on where the keys differ
pub fn is_valid_api_key(provided: Option<&str>, expected: &str) -> bool {
    provided
        .map(|key| key_fingerprint(key.trim()) == key_fingerprint(expected))
        .unwrap_or(false)
}

/// Rejects requests without the configured `x-api-key`
pub async fn require_api_key(
    State(app): State<RateDeskApp>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if !is_valid_api_key(provided, &app.config().api_key) {
        tracing::warn!("Rejected {} {}: bad api key", request.method(), request.uri().path());
        return Err(RateDeskError::Unauthorized.into());
    }

    Ok(next.run(request).await)
}

//! Operator API key authentication middleware.
//!
//! The demo server is meant to sit behind an operator. When `API_KEY_HASH`
//! is configured, every protected request must carry the matching key:
//! 1. Extract the key from the `Authorization: Bearer <key>` header
//! 2. Hash it with SHA-256
//! 3. Compare the hex digest with the configured hash
//! 4. Reject mismatches with HTTP 401

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::{error::AppError, state::AppState};

/// Hex SHA-256 of an API key, the format expected in `API_KEY_HASH`.
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// API key authentication middleware function.
///
/// Without a configured hash every request passes; startup logs a warning.
///
/// # Returns
///
/// - `Ok(Response)` if authenticated (calls next handler)
/// - `Err(AppError::InvalidApiKey)` if the key is missing or wrong (401)
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.api_key_hash.as_deref() else {
        return Ok(next.run(request).await);
    };

    let api_key = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidApiKey)?;

    if !hash_api_key(api_key.trim()).eq_ignore_ascii_case(expected.trim()) {
        return Err(AppError::InvalidApiKey);
    }

    Ok(next.run(request).await)
}

//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// External system an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Meta,
    Twilio,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Meta => f.write_str("Meta"),
            Provider::Twilio => f.write_str("Twilio"),
        }
    }
}

/// Application-wide error type.
///
/// Every service function returns `Result<T, AppError>`. Handlers let the
/// error bubble up and the `IntoResponse` impl below turns it into the
/// uniform `{"success": false, "error": {...}}` body.
///
/// # Error Categories
///
/// - **Validation Errors**: caller input missing or malformed, no network call made
/// - **Provider Errors**: non-2xx responses from Meta or Twilio
/// - **Credential Errors**: OAuth rejections, expired tokens, unusable subaccount credentials
/// - **Transport Errors**: connectivity failures and malformed provider payloads
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    Validation(String),

    /// OAuth token endpoint rejected the exchange.
    ///
    /// `description` is never empty: it falls back to the error text or raw body.
    #[error("OAuth token exchange failed: {error} - {description}")]
    Auth { error: String, description: String },

    /// Provider answered with a non-success HTTP status.
    #[error("{provider} API error (status {status}): {message}")]
    ProviderApi {
        provider: Provider,
        status: u16,
        code: Option<i64>,
        message: String,
        details: Option<String>,
    },

    /// Subaccount exists but no credential path could be established.
    #[error("Authentication setup failed: {0}")]
    AuthSetup(String),

    /// Target subaccount SID is the main account SID.
    #[error("Invalid subaccount SID: {0}")]
    InvalidSubaccount(String),

    /// Refresh failed and the current token is already expired.
    #[error("Token refresh failed and the current token is expired")]
    TokenExpired,

    /// Operator API key is missing or does not match.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Inbound provider callback failed signature verification.
    #[error("Invalid request signature")]
    InvalidSignature,

    /// Request never produced a usable response (DNS, TLS, timeout, reset).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a body that does not match the expected shape.
    #[error("Malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Provider message, if this error came from a provider response.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            AppError::ProviderApi { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "success": false,
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Provider errors additionally carry `provider`, `status`, `provider_code`
/// and `details` (the raw provider body).
///
/// # Status Code Mapping
///
/// - `Validation` → 400 Bad Request
/// - `Auth`, `TokenExpired`, `InvalidApiKey` → 401 Unauthorized
/// - `InvalidSignature` → 403 Forbidden
/// - `InvalidSubaccount` → 422 Unprocessable Entity
/// - `ProviderApi` → 502 Bad Gateway (429 passes through)
/// - `AuthSetup` → 500 Internal Server Error
/// - `Http`, `Decode` → 502 Bad Gateway
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code, extra) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                json!({ "message": msg }),
            ),
            AppError::Auth { error, description } => (
                StatusCode::UNAUTHORIZED,
                "oauth_error",
                json!({ "error": error, "error_description": description }),
            ),
            AppError::ProviderApi {
                provider,
                status,
                code,
                details,
                ..
            } => {
                let http_status = if *status == 429 {
                    StatusCode::TOO_MANY_REQUESTS
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (
                    http_status,
                    "provider_api_error",
                    json!({
                        "provider": provider,
                        "status": status,
                        "provider_code": code,
                        "details": details,
                    }),
                )
            }
            AppError::AuthSetup(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth_setup_error",
                json!({}),
            ),
            AppError::InvalidSubaccount(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_subaccount",
                json!({}),
            ),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired", json!({})),
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key", json!({})),
            AppError::InvalidSignature => {
                (StatusCode::FORBIDDEN, "invalid_signature", json!({}))
            }
            AppError::Http(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream_unreachable",
                json!({}),
            ),
            AppError::Decode(_) => (
                StatusCode::BAD_GATEWAY,
                "invalid_provider_response",
                json!({}),
            ),
        };

        let mut error = json!({ "code": code, "message": message });
        if let (Some(target), Some(source)) = (error.as_object_mut(), extra.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }

        let body = Json(json!({
            "success": false,
            "error": error
        }));

        (status, body).into_response()
    }
}

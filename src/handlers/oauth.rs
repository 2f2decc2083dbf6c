//! Meta OAuth endpoints for the embedded signup flow.
//!
//! - GET /api/v1/signup/config - Values the front end needs to launch signup
//! - POST /api/v1/oauth/token - Exchange an authorization code
//! - POST /api/v1/oauth/token/extend - Long-lived token exchange
//! - POST /api/v1/oauth/token/refresh - Refresh a token close to expiry
//! - POST /api/v1/oauth/token/revoke - Revoke a token
//! - POST /api/v1/oauth/token/inspect - Validity and expiry of a token

use axum::{Json, extract::State};
use chrono::Duration;
use serde::Serialize;

use crate::{
    error::AppError,
    handlers::{ApiResult, ok},
    models::token::{
        AccessToken, AccessTokenInformation, AccessTokenRequest, ExchangeCodeRequest,
        ExtendTokenRequest, RefreshedToken, RevokeResult,
    },
    services::graph_client::DEFAULT_REFRESH_BUFFER_DAYS,
    state::AppState,
};

/// Public values for `FB.login`. The app secret never leaves the server.
#[derive(Debug, Serialize)]
pub struct SignupConfig {
    pub app_id: String,
    pub configuration_id: Option<String>,
    pub partner_solution_id: Option<String>,
    pub graph_api_version: String,
}

pub async fn signup_config(State(state): State<AppState>) -> ApiResult<SignupConfig> {
    let config = &state.config;
    Ok(ok(SignupConfig {
        app_id: config.meta_app_id.clone(),
        configuration_id: config.meta_configuration_id.clone(),
        partner_solution_id: config.meta_partner_solution_id.clone(),
        graph_api_version: config.graph_api_version.clone(),
    }))
}

/// Exchange an embedded signup authorization code.
///
/// # Endpoint
///
/// `POST /api/v1/oauth/token`
///
/// # Request Body
///
/// ```json
/// { "code": "AQB...", "redirect_uri": "https://app.example.com/callback" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: the access token
/// - **Error (400)**: empty code
/// - **Error (401)**: Meta rejected the code (`oauth_error`)
pub async fn exchange(
    State(state): State<AppState>,
    Json(request): Json<ExchangeCodeRequest>,
) -> ApiResult<AccessToken> {
    let token = state
        .graph
        .exchange_code(&request.code, request.redirect_uri.as_deref())
        .await?;
    Ok(ok(token))
}

pub async fn extend(
    State(state): State<AppState>,
    Json(request): Json<ExtendTokenRequest>,
) -> ApiResult<AccessToken> {
    let token = state
        .graph
        .extend_token(&request.access_token, request.expire_in_60_days)
        .await?;
    Ok(ok(token))
}

/// Refresh a token that expires within `buffer_days` (default 7).
///
/// A negative or out-of-range `buffer_days` is a 400 `validation_error`.
///
/// Tokens that never expire, or expire later than the window, come back
/// unchanged. The `status` field says which branch was taken.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<AccessTokenRequest>,
) -> ApiResult<RefreshedToken> {
    let days = request.buffer_days.unwrap_or(DEFAULT_REFRESH_BUFFER_DAYS);
    if days < 0 {
        return Err(AppError::validation("buffer_days cannot be negative"));
    }
    let buffer = Duration::try_days(days)
        .ok_or_else(|| AppError::validation("buffer_days is out of range"))?;
    let refreshed = state
        .graph
        .refresh_if_expired(&request.access_token, buffer)
        .await?;
    Ok(ok(refreshed))
}

pub async fn revoke(
    State(state): State<AppState>,
    Json(request): Json<AccessTokenRequest>,
) -> ApiResult<RevokeResult> {
    let revoked = state.graph.revoke(&request.access_token).await?;
    Ok(ok(RevokeResult { revoked }))
}

pub async fn inspect(
    State(state): State<AppState>,
    Json(request): Json<AccessTokenRequest>,
) -> ApiResult<AccessTokenInformation> {
    let info = state
        .graph
        .access_token_information(&request.access_token)
        .await?;
    Ok(ok(info))
}

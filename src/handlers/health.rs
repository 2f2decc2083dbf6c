//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    handlers::{ApiResponse, ok},
    state::AppState,
};

/// Health check response.
///
/// Reports which provider integrations are configured. No provider is
/// contacted.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub graph_api_version: String,
    /// Main Twilio token present, so subaccounts can be created.
    pub twilio_main_token: bool,
    pub twilio_request_validation: bool,
    pub bundle_required_countries: Vec<String>,
    pub operator_auth: bool,
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "status": "healthy",
///     "graph_api_version": "v23.0",
///     "twilio_main_token": true,
///     "twilio_request_validation": true,
///     "bundle_required_countries": ["GB"],
///     "operator_auth": true,
///     "timestamp": "2026-01-10T19:00:00Z"
///   }
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let config = &state.config;
    ok(HealthResponse {
        status: "healthy".to_string(),
        graph_api_version: config.graph_api_version.clone(),
        twilio_main_token: state.twilio.has_main_auth_token(),
        twilio_request_validation: config.twilio_request_validation,
        bundle_required_countries: config.bundle_required_countries.clone(),
        operator_auth: config.api_key_hash.is_some(),
        timestamp: Utc::now(),
    })
}

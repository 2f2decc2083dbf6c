//! Regulatory compliance endpoints.
//!
//! - POST /api/v1/regulatory/requirements - Does a country need a bundle
//! - POST /api/v1/regulatory/bundles - Create and submit a bundle

use axum::{Json, extract::State};

use crate::{
    handlers::{ApiResult, ok},
    models::twilio::{BundleCreation, BundleRequirement, CheckRequirementsRequest, CreateBundleRequest},
    services::bundle_service,
    state::AppState,
};

/// Whether a country needs a regulatory bundle.
///
/// # Request Body
///
/// ```json
/// { "iso_country": "GB", "number_type": "mobile" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `requires_bundle`, `supported_country` and a message
/// - **Error (400)**: `number_type` is not `local` or `mobile` (case-insensitive),
///   or the country is empty
pub async fn requirements(
    State(state): State<AppState>,
    Json(request): Json<CheckRequirementsRequest>,
) -> ApiResult<BundleRequirement> {
    let requirement = bundle_service::check_requirements(
        &state.config.bundle_required_countries,
        &request.iso_country,
        &request.number_type,
    )?;
    Ok(ok(requirement))
}

/// Create a regulatory bundle under the subaccount.
///
/// The request is validated in full before anything is sent to Twilio. The
/// response lists every step, including best-effort assignment failures.
pub async fn create_bundle(
    State(state): State<AppState>,
    Json(request): Json<CreateBundleRequest>,
) -> ApiResult<BundleCreation> {
    bundle_service::validate_bundle_request(&request)?;
    let creds = state.twilio.subaccount_credentials(
        &request.subaccount_sid,
        request.subaccount_auth_token.as_deref(),
    )?;
    let creation = bundle_service::create_bundle(&state.twilio, &creds, &request).await?;
    Ok(ok(creation))
}

//! Twilio subaccount endpoints.
//!
//! - POST /api/v1/subaccounts - Create a subaccount for an onboarded business
//! - POST /api/v1/subaccounts/countries - Countries with numbers for a subaccount

use axum::{Json, extract::State};

use crate::{
    handlers::{ApiResult, ok},
    models::twilio::{AvailableCountry, CreateSubaccountRequest, ProvisionedSubaccount, SubaccountRef},
    services::subaccount_service,
    state::AppState,
};

/// Create a subaccount named after the business and WABA.
///
/// # Request Body
///
/// ```json
/// { "business_name": "Acme Ltd", "waba_id": "104996..." }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: the subaccount, including its own auth token when Twilio returns one
/// - **Error (400)**: missing business name or WABA ID
/// - **Error (500)**: main auth token not configured (`auth_setup_error`)
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateSubaccountRequest>,
) -> ApiResult<ProvisionedSubaccount> {
    let subaccount =
        subaccount_service::create_subaccount(&state.twilio, &request.business_name, &request.waba_id)
            .await?;
    Ok(ok(subaccount))
}

pub async fn countries(
    State(state): State<AppState>,
    Json(request): Json<SubaccountRef>,
) -> ApiResult<Vec<AvailableCountry>> {
    let creds = state.twilio.subaccount_credentials(
        &request.subaccount_sid,
        request.subaccount_auth_token.as_deref(),
    )?;
    let countries = subaccount_service::list_available_countries(&state.twilio, &creds).await?;
    Ok(ok(countries))
}

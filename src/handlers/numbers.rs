//! Phone number endpoints.
//!
//! - POST /api/v1/phone-numbers/available - Search numbers for a subaccount
//! - POST /api/v1/phone-numbers/purchase - Buy a number and move it to the subaccount

use axum::{Json, extract::State};

use crate::{
    handlers::{ApiResult, ok},
    models::twilio::{AvailableNumbersRequest, AvailablePhoneNumber, PurchaseOutcome, PurchaseRequest},
    services::number_service,
    state::AppState,
};

/// An unsupported `number_type` returns an empty list rather than an error.
pub async fn available(
    State(state): State<AppState>,
    Json(request): Json<AvailableNumbersRequest>,
) -> ApiResult<Vec<AvailablePhoneNumber>> {
    let creds = state.twilio.subaccount_credentials(
        &request.subaccount_sid,
        request.subaccount_auth_token.as_deref(),
    )?;
    let numbers = number_service::list_available(
        &state.twilio,
        &creds,
        &request.country_code,
        &request.number_type,
        request.limit,
    )
    .await?;
    Ok(ok(numbers))
}

/// Purchase a number.
///
/// # Response
///
/// - **Success (200 OK)**: the number, its owner and the transfer steps
/// - **Error (422)**: the subaccount SID is the main account SID
/// - **Error (502)**: Twilio rejected the purchase or transfer
pub async fn purchase(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> ApiResult<PurchaseOutcome> {
    let outcome = number_service::purchase(&state.twilio, &state.classifier, &request).await?;
    Ok(ok(outcome))
}

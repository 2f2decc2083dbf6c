//! WhatsApp Business Account discovery.
//!
//! - POST /api/v1/waba/shared - WABA shared with a signup token, plus its numbers
//! - GET /api/v1/waba/{id} - WABA details and health
//! - GET /api/v1/waba/{id}/phone-numbers - Numbers and the most recently onboarded one

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    handlers::{ApiResult, ok},
    models::{
        token::AccessTokenRequest,
        waba::{Waba, WabaOverview, WabaPhoneNumbers},
    },
    state::AppState,
};

/// Everything the onboarding page needs after signup completes.
///
/// # Response
///
/// - **Success (200 OK)**: WABA ID, details, numbers and the resolved business name
/// - **Error (400)**: token carries no WhatsApp business scope
/// - **Error (502)**: Graph API failure
pub async fn shared(
    State(state): State<AppState>,
    Json(request): Json<AccessTokenRequest>,
) -> ApiResult<WabaOverview> {
    let overview = state
        .graph
        .shared_waba_overview(&request.access_token)
        .await?;
    Ok(ok(overview))
}

pub async fn details(State(state): State<AppState>, Path(waba_id): Path<String>) -> ApiResult<Waba> {
    Ok(ok(state.graph.get_waba_details(&waba_id).await?))
}

pub async fn phone_numbers(
    State(state): State<AppState>,
    Path(waba_id): Path<String>,
) -> ApiResult<WabaPhoneNumbers> {
    Ok(ok(state.graph.waba_phone_numbers(&waba_id).await?))
}

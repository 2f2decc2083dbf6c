//! HTTP request handlers (route handlers).
//!
//! Handlers stay thin: extract the request, call one service operation and
//! wrap the result in the success envelope. Errors are rendered by
//! [`AppError`](crate::error::AppError).

use axum::Json;
use serde::Serialize;

/// Health and configuration summary
pub mod health;
/// Inbound WhatsApp status callbacks
pub mod notifications;
/// Phone number search and purchase
pub mod numbers;
/// Meta OAuth token endpoints
pub mod oauth;
/// Regulatory bundle endpoints
pub mod regulatory;
/// WhatsApp sender registration
pub mod senders;
/// Twilio subaccount endpoints
pub mod subaccounts;
/// Content template endpoints
pub mod templates;
/// WABA discovery endpoints
pub mod waba;

/// Success body: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, crate::error::AppError>;

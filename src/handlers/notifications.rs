//! Inbound WhatsApp status callbacks from Twilio.
//!
//! This endpoint is public: Twilio cannot send the operator API key. When
//! request validation is on and the main auth token is configured, the
//! `X-Twilio-Signature` header is checked instead.

use std::collections::BTreeMap;

use axum::{Form, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::{
    error::AppError,
    handlers::{ApiResult, ok},
    services::signature,
    state::AppState,
};

pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub received: bool,
}

/// Acknowledge a WhatsApp notification.
///
/// # Response
///
/// - **Success (200 OK)**: callback accepted and logged
/// - **Error (403)**: signature missing or wrong (`invalid_signature`)
pub async fn whatsapp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<BTreeMap<String, String>>,
) -> ApiResult<Acknowledgement> {
    verify_request(&state, &headers, &params)?;

    let field = |key: &str| params.get(key).map(String::as_str).unwrap_or("");
    tracing::info!(
        message_sid = field("MessageSid"),
        status = field("MessageStatus"),
        from = field("From"),
        to = field("To"),
        "WhatsApp notification received"
    );
    if let Some(code) = params.get("ErrorCode") {
        tracing::warn!(
            message_sid = field("MessageSid"),
            error_code = %code,
            "WhatsApp message reported an error"
        );
    }

    Ok(ok(Acknowledgement { received: true }))
}

fn verify_request(
    state: &AppState,
    headers: &HeaderMap,
    params: &BTreeMap<String, String>,
) -> Result<(), AppError> {
    if !state.config.twilio_request_validation {
        return Ok(());
    }
    let Some(auth_token) = state.config.twilio_auth_token.as_deref() else {
        tracing::warn!("Request validation is enabled but TWILIO_AUTH_TOKEN is not set, skipping");
        return Ok(());
    };

    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    let url = state.config.notification_webhook_url();
    if signature::verify_signature(auth_token, &url, params, provided)? {
        Ok(())
    } else {
        tracing::warn!("Rejected notification with an invalid Twilio signature");
        Err(AppError::InvalidSignature)
    }
}

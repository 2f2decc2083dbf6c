//! WhatsApp sender registration.
//!
//! Registering a Twilio number as a WhatsApp sender is what links the
//! subaccount to the business's WABA. Inbound events for the sender are
//! delivered to the registered webhook.

use serde_json::json;

use crate::{
    error::AppError,
    models::twilio::{RegisteredSender, RegisterSenderRequest},
    services::twilio_client::{MESSAGING_BASE, TwilioClient},
};

/// Register a number as a WhatsApp sender for a WABA.
///
/// # Errors
///
/// - `Validation`: missing fields or an unacceptable webhook URL
/// - `AuthSetup`: no usable credentials for the subaccount
/// - `ProviderApi`: Twilio rejected the registration (returned unchanged)
pub async fn register(
    twilio: &TwilioClient,
    request: &RegisterSenderRequest,
    webhook_url: &str,
) -> Result<RegisteredSender, AppError> {
    let subaccount_sid = request.subaccount_sid.trim();
    if subaccount_sid.is_empty() {
        return Err(AppError::validation("Subaccount SID is required"));
    }
    if request.waba_id.trim().is_empty() {
        return Err(AppError::validation("WABA ID is required"));
    }
    if request.business_name.trim().is_empty() {
        return Err(AppError::validation("Business name is required"));
    }
    validate_webhook_url(webhook_url)?;

    let sender_id = whatsapp_sender_id(&request.phone_number)?;
    let creds =
        twilio.subaccount_credentials(subaccount_sid, request.subaccount_auth_token.as_deref())?;

    tracing::info!(
        sender_id = %sender_id,
        waba_id = %request.waba_id,
        subaccount_sid,
        method = creds.method(),
        "Registering WhatsApp sender"
    );

    let payload = json!({
        "sender_id": sender_id,
        "configuration": { "waba_id": request.waba_id.trim() },
        "profile": { "name": request.business_name.trim() },
        "webhook": {
            "callback_url": webhook_url,
            "callback_method": "POST"
        }
    });

    let result: Result<RegisteredSender, AppError> = twilio
        .post_json(&creds, format!("{MESSAGING_BASE}/Channels/Senders"), payload)
        .await;

    match result {
        Ok(sender) => {
            tracing::info!(
                sender_sid = %sender.sid,
                status = sender.status.as_deref().unwrap_or("unknown"),
                "WhatsApp sender registered, WABA linked to subaccount {subaccount_sid}"
            );
            Ok(sender)
        }
        Err(err) => {
            if looks_transient(&err) {
                tracing::error!(
                    sender_id = %sender_id,
                    "Sender registration failed with an unreadable or missing response, \
                     check connectivity, credentials and rate limits: {err}"
                );
            } else {
                tracing::error!(sender_id = %sender_id, "Sender registration failed: {err}");
            }
            Err(err)
        }
    }
}

/// `whatsapp:+E164` form of a phone number. Accepts input with or without the
/// `whatsapp:` prefix and the leading `+`.
pub fn whatsapp_sender_id(phone_number: &str) -> Result<String, AppError> {
    let bare = phone_number.trim();
    let bare = bare.strip_prefix("whatsapp:").unwrap_or(bare).trim();
    let digits = bare.trim_start_matches('+');
    if digits.is_empty() {
        return Err(AppError::validation("Phone number is required"));
    }
    Ok(format!("whatsapp:+{digits}"))
}

/// Failures that point at connectivity or a malformed response rather than
/// a rejected request. Only used to enrich the log.
pub fn looks_transient(err: &AppError) -> bool {
    match err {
        AppError::Http(_) | AppError::Decode(_) => true,
        AppError::ProviderApi { message, .. } => {
            message.contains("JSON") || message.contains("parse")
        }
        _ => false,
    }
}

/// Validate a webhook callback URL.
///
/// # Rules
///
/// - Must not exceed 2048 characters
/// - Must be a valid URL
/// - Must use HTTPS (HTTP allowed for localhost testing)
pub fn validate_webhook_url(url: &str) -> Result<(), AppError> {
    if url.len() > 2048 {
        return Err(AppError::validation("Webhook URL exceeds 2048 characters"));
    }

    let parsed = url::Url::parse(url)
        .map_err(|_| AppError::validation("Webhook URL has an invalid format"))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => match parsed.host_str() {
            Some("localhost") | Some("127.0.0.1") | Some("0.0.0.0") => Ok(()),
            _ => Err(AppError::validation(
                "HTTP webhook URLs are only allowed for localhost. Use HTTPS for production.",
            )),
        },
        _ => Err(AppError::validation("Webhook URL must use HTTP or HTTPS")),
    }
}

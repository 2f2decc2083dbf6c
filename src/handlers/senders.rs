//! WhatsApp sender registration endpoint.

use axum::{Json, extract::State};

use crate::{
    handlers::{ApiResult, ok},
    models::twilio::{RegisterSenderRequest, RegisteredSender},
    services::sender_service,
    state::AppState,
};

/// Register a purchased number as a WhatsApp sender on the business's WABA.
///
/// # Endpoint
///
/// `POST /api/v1/senders`
///
/// Without `webhook_url`, status callbacks are sent to this server's
/// `/api/v1/notifications/whatsapp`.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterSenderRequest>,
) -> ApiResult<RegisteredSender> {
    let webhook_url = request
        .webhook_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| state.config.notification_webhook_url());

    let sender = sender_service::register(&state.twilio, &request, &webhook_url).await?;
    Ok(ok(sender))
}

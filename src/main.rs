//! WhatsApp Onboarding Server - Main Application Entry Point
//!
//! Demo REST API over the onboarding library: Meta embedded signup, WABA
//! discovery and Twilio provisioning, plus the inbound notification webhook.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Build the shared HTTP client used for every provider call
//! 3. Build HTTP router with routes and middleware
//! 4. Start server on configured port

use std::{sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;
use whatsapp_onboarding::{config::Config, http::ReqwestTransport, router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        graph_api_version = %config.graph_api_version,
        twilio_account = %config.twilio_account_sid,
        "Configuration loaded"
    );
    if config.api_key_hash.is_none() {
        tracing::warn!("API_KEY_HASH is not set, /api/v1 routes are open to anyone");
    }
    if config.twilio_auth_token.is_none() {
        tracing::warn!("TWILIO_AUTH_TOKEN is not set, subaccount creation and delegated access are unavailable");
    }

    let transport = ReqwestTransport::with_timeout(Duration::from_secs(config.http_timeout_secs))?;
    let port = config.server_port;
    let app = router(AppState::new(config, Arc::new(transport)));

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `META_APP_ID`, `META_APP_SECRET` (required): embedded signup app credentials
/// - `META_ACCESS_TOKEN` (required): system user token used to inspect tokens and read WABAs
/// - `TWILIO_ACCOUNT_SID` (required): main Twilio account
/// - `TWILIO_AUTH_TOKEN` (optional): main account token, needed for delegated subaccount access
/// - `REGULATORY_BUNDLES_MOBILE` / `REGULATORY_BUNDLES_LOCAL` (optional): `GB=BU123,IE=BU456`
/// - `BUNDLE_REQUIRED_COUNTRIES` (optional): countries that need a regulatory bundle, defaults to `GB`
/// - `API_KEY_HASH` (optional): hex SHA-256 of the operator API key
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Externally reachable base URL, used to build the WhatsApp webhook callback.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_graph_api_base_url")]
    pub graph_api_base_url: String,

    #[serde(default = "default_graph_api_version")]
    pub graph_api_version: String,

    pub meta_app_id: String,
    pub meta_app_secret: String,
    pub meta_access_token: String,

    #[serde(default)]
    pub meta_configuration_id: Option<String>,

    #[serde(default)]
    pub meta_partner_solution_id: Option<String>,

    pub twilio_account_sid: String,

    #[serde(default)]
    pub twilio_auth_token: Option<String>,

    /// Verify `X-Twilio-Signature` on inbound notifications.
    #[serde(default = "default_true")]
    pub twilio_request_validation: bool,

    #[serde(default, deserialize_with = "country_table")]
    pub regulatory_bundles_mobile: HashMap<String, String>,

    #[serde(default, deserialize_with = "country_table")]
    pub regulatory_bundles_local: HashMap<String, String>,

    #[serde(
        default = "default_bundle_countries",
        deserialize_with = "country_list"
    )]
    pub bundle_required_countries: Vec<String>,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub api_key_hash: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_graph_api_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_graph_api_version() -> String {
    "v23.0".to_string()
}

fn default_true() -> bool {
    true
}

/// Only GB is known to need a bundle. Extend through configuration once product confirms more.
fn default_bundle_countries() -> Vec<String> {
    vec!["GB".to_string()]
}

fn default_http_timeout() -> u64 {
    600
}

/// Parse `GB=BU123, IE=BU456` into an uppercase-keyed map.
fn country_table<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_country_table(&raw).map_err(serde::de::Error::custom)
}

fn country_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect())
}

pub(crate) fn parse_country_table(raw: &str) -> Result<HashMap<String, String>, String> {
    let mut table = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (country, sid) = entry
            .split_once('=')
            .ok_or_else(|| format!("expected COUNTRY=BUNDLE_SID, got `{entry}`"))?;
        let (country, sid) = (country.trim(), sid.trim());
        if country.is_empty() || sid.is_empty() {
            return Err(format!("empty country or bundle sid in `{entry}`"));
        }
        table.insert(country.to_uppercase(), sid.to_string());
    }
    Ok(table)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., META_APP_ID)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: meta_app_id -> META_APP_ID
        envy::from_env::<Config>()
    }

    /// Callback registered with the sender so inbound events reach this server.
    pub fn notification_webhook_url(&self) -> String {
        format!(
            "{}/api/v1/notifications/whatsapp",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

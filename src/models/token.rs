//! OAuth token models for the Meta embedded signup flow.
//!
//! # Token Lifecycle
//!
//! 1. Front end completes embedded signup and posts the authorization code
//! 2. Code is exchanged for an access token (`POST /api/v1/oauth/token`)
//! 3. Short-lived tokens can be extended to 60 days
//! 4. Tokens close to expiry are refreshed, never-expiring tokens are left alone
//! 5. Tokens can be revoked on demand

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Access token returned by the OAuth endpoint. Owned by the caller, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Raw OAuth response. Success and failure share one shape on the Graph API,
/// and `error` is either a plain string or an object.
#[derive(Debug, Deserialize)]
pub(crate) struct ExchangeTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ExchangeTokenResponse {
    /// Human-readable text of the `error` field: the string itself, or the
    /// object's `message`, then `type`, then the raw JSON.
    pub fn error_text(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj
                .get("message")
                .or_else(|| obj.get("type"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(Value::Object(obj.clone()).to_string())),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenDebugResponse {
    #[serde(default)]
    pub data: Option<TokenDebugInfo>,
}

/// `debug_token` payload describing the inspected token.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenDebugInfo {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub data_access_expires_at: Option<i64>,
    /// Epoch seconds. `0` means the token never expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub granular_scopes: Vec<GranularScope>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GranularScope {
    pub scope: String,
    #[serde(default)]
    pub target_ids: Vec<String>,
}

/// Derived view of a token's validity at a given instant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AccessTokenInformation {
    pub access_token: String,
    pub is_valid: bool,
    pub is_expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// Whole seconds left. Absent when expired or when the token never expires.
    pub time_until_expiration: Option<i64>,
    pub app_id: Option<String>,
    pub user_id: Option<String>,
    pub waba_id: Option<String>,
}

/// Which branch `refresh_if_expired` took.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    NeverExpires,
    NotDue,
    Refreshed,
    KeptAfterFailedExtension,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
    pub status: RefreshStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RevokeResponse {
    #[serde(default)]
    pub success: bool,
}

/// Request to exchange an embedded signup authorization code.
///
/// # Example
///
/// ```json
/// {
///   "code": "AQB...",
///   "redirect_uri": "https://demo.example.com/signup/callback"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ExchangeCodeRequest {
    pub code: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtendTokenRequest {
    pub access_token: String,
    #[serde(default = "default_true")]
    pub expire_in_60_days: bool,
}

fn default_true() -> bool {
    true
}

/// Body for refresh, revoke and the shared-WABA lookup.
#[derive(Debug, Deserialize)]
pub struct AccessTokenRequest {
    pub access_token: String,
    /// Refresh window in days, defaults to 7.
    #[serde(default)]
    pub buffer_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RevokeResult {
    pub revoked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ExchangeTokenResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn error_text_accepts_string_and_object_forms() {
        assert_eq!(
            parse(r#"{"error":"invalid_grant"}"#).error_text().as_deref(),
            Some("invalid_grant")
        );
        assert_eq!(
            parse(r#"{"error":{"message":"Invalid code","type":"OAuthException"}}"#)
                .error_text()
                .as_deref(),
            Some("Invalid code")
        );
        assert_eq!(
            parse(r#"{"error":{"type":"OAuthException"}}"#)
                .error_text()
                .as_deref(),
            Some("OAuthException")
        );
        assert!(parse(r#"{"access_token":"t"}"#).error_text().is_none());
    }

    #[test]
    fn debug_info_reads_type_field() {
        let info: TokenDebugResponse = serde_json::from_str(
            r#"{"data":{"app_id":"1","type":"USER","expires_at":0,"is_valid":true,
                "granular_scopes":[{"scope":"whatsapp_business_management","target_ids":["42"]}]}}"#,
        )
        .unwrap();
        let data = info.data.unwrap();
        assert_eq!(data.token_type.as_deref(), Some("USER"));
        assert_eq!(data.expires_at, Some(0));
        assert_eq!(data.granular_scopes[0].target_ids, vec!["42"]);
    }
}

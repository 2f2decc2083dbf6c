//! Meta Graph API client for embedded signup.
//!
//! Covers the OAuth token lifecycle (exchange, extend, refresh, revoke) and
//! read-only discovery of the WhatsApp Business Account shared during signup.
//!
//! # Authentication
//!
//! OAuth calls authenticate with the app ID and secret in the form body.
//! Every other call uses the configured system access token as a bearer
//! token, including `debug_token`, which inspects a different token.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::{
    config::Config,
    error::{AppError, Provider},
    http::{HttpRequest, HttpResponse, HttpTransport, with_query},
    models::{
        token::{
            AccessToken, AccessTokenInformation, ExchangeTokenResponse, RefreshStatus,
            RefreshedToken, RevokeResponse, TokenDebugResponse,
        },
        waba::{PhoneNumberList, Waba, WabaOverview, WabaPhoneNumber, WabaPhoneNumbers},
    },
};

/// Fields requested for WABA details.
pub const WABA_FIELDS: &str = "id,name,currency,timezone_id,message_template_namespace,account_review_status,business_verification_status,country,owner_business_info,primary_business_location,purchase_order_number,status,health_status";

/// Granular scopes whose targets are WABA IDs.
const WHATSAPP_SCOPES: [&str; 2] = ["whatsapp_business_management", "whatsapp_business_messaging"];

/// Default window before expiry in which a token gets extended.
pub const DEFAULT_REFRESH_BUFFER_DAYS: i64 = 7;

#[derive(Clone)]
pub struct GraphClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    version: String,
    app_id: String,
    app_secret: String,
    system_token: String,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

impl GraphClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &Config) -> Self {
        Self {
            transport,
            base_url: config.graph_api_base_url.trim_end_matches('/').to_string(),
            version: config.graph_api_version.clone(),
            app_id: config.meta_app_id.clone(),
            app_secret: config.meta_app_secret.clone(),
            system_token: config.meta_access_token.clone(),
        }
    }

    fn oauth_url(&self) -> String {
        format!("{}/oauth/access_token", self.base_url)
    }

    fn versioned(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.version, path)
    }

    /// Exchange an embedded signup authorization code for an access token.
    ///
    /// # Errors
    ///
    /// - `Validation` if `code` is empty (no request is made)
    /// - `Auth` if Meta rejects the code
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<AccessToken, AppError> {
        if code.trim().is_empty() {
            return Err(AppError::validation("Authorization code cannot be empty"));
        }

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_secret.as_str()),
            ("code", code),
        ];
        if let Some(uri) = redirect_uri.filter(|u| !u.is_empty()) {
            form.push(("redirect_uri", uri));
        }

        let response = self
            .transport
            .send(HttpRequest::post(self.oauth_url()).form(form))
            .await?;

        let token = parse_token_response(&response)?;
        tracing::info!("Exchanged authorization code for access token");
        Ok(token)
    }

    /// Exchange a short-lived token for a long-lived one.
    pub async fn extend_token(
        &self,
        short_lived: &str,
        expire_in_60_days: bool,
    ) -> Result<AccessToken, AppError> {
        if short_lived.trim().is_empty() {
            return Err(AppError::validation("Short-lived token cannot be empty"));
        }

        let expire_flag = if expire_in_60_days { "true" } else { "false" };
        let form = [
            ("grant_type", "fb_exchange_token"),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_secret.as_str()),
            ("set_token_expires_in_60_days", expire_flag),
            ("fb_exchange_token", short_lived),
        ];

        let response = self
            .transport
            .send(HttpRequest::post(self.oauth_url()).form(form))
            .await?;

        parse_token_response(&response)
    }

    /// Inspect a token with `debug_token`.
    pub async fn debug_token(&self, input_token: &str) -> Result<TokenDebugResponse, AppError> {
        if input_token.trim().is_empty() {
            return Err(AppError::validation("Input token cannot be empty"));
        }

        let url = with_query(&self.versioned("debug_token"), [("input_token", input_token)])?;
        let response = self
            .transport
            .send(HttpRequest::get(url).bearer(&self.system_token))
            .await?;

        ensure_success(&response)?;
        response.decode()
    }

    /// WABA shared with the app during signup, if the token grants one.
    pub async fn get_shared_waba_id(&self, token: &str) -> Result<Option<String>, AppError> {
        let debug = self.debug_token(token).await?;
        Ok(shared_waba_id(&debug))
    }

    /// Current validity of a token.
    pub async fn access_token_information(
        &self,
        token: &str,
    ) -> Result<AccessTokenInformation, AppError> {
        let debug = self.debug_token(token).await?;
        Ok(access_token_information(&debug, token, Utc::now()))
    }

    /// Extend the token when it is expired or expires within `buffer`.
    ///
    /// # Process
    ///
    /// 1. Inspect the token
    /// 2. `expires_at == 0` → return it unchanged
    /// 3. Expiry beyond `now + buffer` → return it unchanged (a buffer past
    ///    the representable range counts as due)
    /// 4. Otherwise extend it
    /// 5. Extension failed or came back empty → keep the current token if it
    ///    is still valid, else fail with `TokenExpired`
    pub async fn refresh_if_expired(
        &self,
        token: &str,
        buffer: Duration,
    ) -> Result<RefreshedToken, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::validation("Current token cannot be empty"));
        }

        let debug = self.debug_token(token).await?;
        let now = Utc::now();

        if debug.data.as_ref().and_then(|d| d.expires_at) == Some(0) {
            return Ok(RefreshedToken {
                access_token: token.to_string(),
                status: RefreshStatus::NeverExpires,
            });
        }

        let info = access_token_information(&debug, token, now);
        let window_end = now.checked_add_signed(buffer);
        let due = info.is_expired
            || info
                .expires_at
                .is_some_and(|at| window_end.is_none_or(|end| at <= end));
        if !due {
            return Ok(RefreshedToken {
                access_token: token.to_string(),
                status: RefreshStatus::NotDue,
            });
        }

        match self.extend_token(token, true).await {
            Ok(extended) if !extended.access_token.is_empty() => {
                tracing::info!("Access token extended");
                Ok(RefreshedToken {
                    access_token: extended.access_token,
                    status: RefreshStatus::Refreshed,
                })
            }
            outcome => {
                if let Err(err) = &outcome {
                    tracing::warn!("Token extension failed: {err}");
                }
                if info.is_valid && !info.is_expired {
                    Ok(RefreshedToken {
                        access_token: token.to_string(),
                        status: RefreshStatus::KeptAfterFailedExtension,
                    })
                } else {
                    tracing::error!("Token extension failed and the current token is expired");
                    Err(AppError::TokenExpired)
                }
            }
        }
    }

    /// Revoke a token. Returns Meta's `success` flag.
    pub async fn revoke(&self, token: &str) -> Result<bool, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::validation("Token to revoke cannot be empty"));
        }

        let url = with_query(
            &self.versioned("oauth/revoke"),
            [
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("revoke_token", token),
                ("access_token", self.system_token.as_str()),
            ],
        )?;

        let response = self
            .transport
            .send(HttpRequest::get(url).bearer(&self.system_token))
            .await?;

        ensure_success(&response)?;
        let body: RevokeResponse = response.decode()?;
        Ok(body.success)
    }

    pub async fn get_waba_details(&self, waba_id: &str) -> Result<Waba, AppError> {
        if waba_id.trim().is_empty() {
            return Err(AppError::validation("WABA ID cannot be empty"));
        }

        let url = with_query(&self.versioned(waba_id), [("fields", WABA_FIELDS)])?;
        let response = self
            .transport
            .send(HttpRequest::get(url).bearer(&self.system_token))
            .await?;

        ensure_success(&response)?;
        response.decode()
    }

    pub async fn get_phone_numbers(&self, waba_id: &str) -> Result<PhoneNumberList, AppError> {
        if waba_id.trim().is_empty() {
            return Err(AppError::validation("WABA ID cannot be empty"));
        }

        let url = self.versioned(&format!("{waba_id}/phone_numbers"));
        let response = self
            .transport
            .send(HttpRequest::get(url).bearer(&self.system_token))
            .await?;

        ensure_success(&response)?;
        response.decode()
    }

    /// Phone numbers of a WABA plus the one onboarded most recently.
    pub async fn waba_phone_numbers(&self, waba_id: &str) -> Result<WabaPhoneNumbers, AppError> {
        let phone_numbers = self.get_phone_numbers(waba_id).await?;
        let latest_phone_number = most_recently_onboarded(&phone_numbers.data).cloned();
        Ok(WabaPhoneNumbers {
            phone_numbers,
            latest_phone_number,
        })
    }

    /// Everything known about the WABA shared through a signup token.
    ///
    /// Phone number lookup failures are logged and tolerated; the overview
    /// then carries no numbers.
    pub async fn shared_waba_overview(&self, token: &str) -> Result<WabaOverview, AppError> {
        let waba_id = self
            .get_shared_waba_id(token)
            .await?
            .ok_or_else(|| AppError::validation("Could not retrieve WABA ID from access token"))?;

        let waba = self.get_waba_details(&waba_id).await?;

        let phone_numbers = match self.get_phone_numbers(&waba_id).await {
            Ok(list) => list.data,
            Err(err) => {
                tracing::warn!(waba_id = %waba_id, "Could not fetch phone numbers: {err}");
                Vec::new()
            }
        };

        let latest_phone_number = most_recently_onboarded(&phone_numbers).cloned();
        let business_name = resolve_business_name(latest_phone_number.as_ref(), &waba);

        tracing::info!(waba_id = %waba_id, business = %business_name, "Resolved shared WABA");

        Ok(WabaOverview {
            waba_id,
            waba,
            phone_numbers,
            latest_phone_number,
            business_name,
        })
    }
}

/// Turn an OAuth response into a token or an `Auth` error.
fn parse_token_response(response: &HttpResponse) -> Result<AccessToken, AppError> {
    let parsed = serde_json::from_str::<ExchangeTokenResponse>(&response.body);

    let error_text = parsed.as_ref().ok().and_then(ExchangeTokenResponse::error_text);
    if !response.is_success() || error_text.is_some() {
        let error = error_text
            .clone()
            .unwrap_or_else(|| format!("HTTP {}", response.status));
        let description = parsed
            .as_ref()
            .ok()
            .and_then(|p| p.error_description.clone())
            .filter(|d| !d.is_empty())
            .or(error_text)
            .unwrap_or_else(|| response.body.clone());
        let description = if description.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            description
        };
        tracing::error!(status = response.status, "OAuth token request rejected: {error}");
        return Err(AppError::Auth { error, description });
    }

    let parsed = parsed?;

    let access_token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Auth {
            error: "missing_access_token".to_string(),
            description: "OAuth response did not contain an access token".to_string(),
        })?;

    Ok(AccessToken {
        access_token,
        token_type: parsed.token_type.unwrap_or_else(|| "bearer".to_string()),
        expires_in: parsed.expires_in,
        scope: parsed.scope,
    })
}

/// Map a non-2xx Graph response to `ProviderApi`, keeping the raw body.
pub(crate) fn ensure_success(response: &HttpResponse) -> Result<(), AppError> {
    if response.is_success() {
        return Ok(());
    }

    let parsed = serde_json::from_str::<GraphErrorBody>(&response.body).ok();
    let code = parsed.as_ref().and_then(|b| b.error.code);
    let message = parsed
        .and_then(|b| b.error.message.or(b.error.kind))
        .unwrap_or_else(|| format!("HTTP {}", response.status));

    tracing::error!(status = response.status, "Graph API call failed: {message}");

    Err(AppError::ProviderApi {
        provider: Provider::Meta,
        status: response.status,
        code,
        message,
        details: Some(response.body.clone()),
    })
}

/// First target of the first WhatsApp granular scope.
pub fn shared_waba_id(debug: &TokenDebugResponse) -> Option<String> {
    debug
        .data
        .as_ref()?
        .granular_scopes
        .iter()
        .find(|s| WHATSAPP_SCOPES.contains(&s.scope.as_str()))?
        .target_ids
        .first()
        .cloned()
}

/// Derive validity and expiry of a token at `now`.
pub fn access_token_information(
    debug: &TokenDebugResponse,
    token: &str,
    now: DateTime<Utc>,
) -> AccessTokenInformation {
    let mut info = AccessTokenInformation {
        access_token: token.to_string(),
        is_valid: false,
        is_expired: true,
        expires_at: None,
        time_until_expiration: None,
        app_id: None,
        user_id: None,
        waba_id: None,
    };

    info.waba_id = shared_waba_id(debug);

    let Some(data) = debug.data.as_ref().filter(|d| d.is_valid) else {
        return info;
    };

    info.is_valid = true;
    info.app_id = data.app_id.clone();
    info.user_id = data.user_id.clone();

    match data.expires_at {
        Some(0) | None => {
            info.is_expired = false;
        }
        Some(epoch) => {
            let expires_at = Utc.timestamp_opt(epoch, 0).single();
            info.expires_at = expires_at;
            info.is_expired = expires_at.is_none_or(|at| at <= now);
            if !info.is_expired {
                info.time_until_expiration = expires_at.map(|at| (at - now).num_seconds());
            }
        }
    }

    info
}

/// Parse a Graph timestamp. Tries `2024-05-01T10:00:00+0000` first, then RFC 3339.
fn parse_onboarded_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Number with the latest parsable `last_onboarded_time`.
pub fn most_recently_onboarded(numbers: &[WabaPhoneNumber]) -> Option<&WabaPhoneNumber> {
    numbers
        .iter()
        .filter_map(|n| {
            n.last_onboarded_time
                .as_deref()
                .and_then(parse_onboarded_time)
                .map(|at| (at, n))
        })
        .max_by_key(|(at, _)| *at)
        .map(|(_, n)| n)
}

/// Verified phone name, then owner business, then WABA name.
pub fn resolve_business_name(phone: Option<&WabaPhoneNumber>, waba: &Waba) -> String {
    phone
        .and_then(|p| p.verified_name.clone())
        .or_else(|| {
            waba.owner_business_info
                .as_ref()
                .and_then(|o| o.name.clone())
        })
        .or_else(|| waba.name.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Unknown Business".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        http::mock::MockTransport,
        models::{
            token::{GranularScope, TokenDebugInfo},
            waba::OwnerBusinessInfo,
        },
        test_support::test_config,
    };
    use reqwest::Method;
    use serde_json::json;

    fn client(transport: &MockTransport) -> GraphClient {
        GraphClient::new(Arc::new(transport.clone()), &test_config())
    }

    fn debug_with(expires_at: Option<i64>, is_valid: bool) -> TokenDebugResponse {
        TokenDebugResponse {
            data: Some(TokenDebugInfo {
                app_id: Some("app".into()),
                expires_at,
                is_valid,
                ..Default::default()
            }),
        }
    }

    fn debug_body(expires_at: i64) -> serde_json::Value {
        json!({"data": {"app_id": "app", "expires_at": expires_at, "is_valid": true, "granular_scopes": []}})
    }

    fn phone(id: &str, onboarded: Option<&str>) -> WabaPhoneNumber {
        WabaPhoneNumber {
            id: id.into(),
            last_onboarded_time: onboarded.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn never_expiring_token_is_not_expired() {
        let info = access_token_information(&debug_with(Some(0), true), "t", Utc::now());
        assert!(info.is_valid);
        assert!(!info.is_expired);
        assert!(info.expires_at.is_none());
        assert!(info.time_until_expiration.is_none());
    }

    #[test]
    fn past_expiry_is_expired_without_remaining_time() {
        let now = Utc::now();
        let past = (now - Duration::hours(1)).timestamp();
        let info = access_token_information(&debug_with(Some(past), true), "t", now);
        assert!(info.is_expired);
        assert!(info.time_until_expiration.is_none());
        assert!(info.expires_at.is_some());
    }

    #[test]
    fn invalid_or_missing_data_is_expired() {
        let info = access_token_information(&debug_with(Some(0), false), "t", Utc::now());
        assert!(!info.is_valid);
        assert!(info.is_expired);

        let info = access_token_information(&TokenDebugResponse::default(), "t", Utc::now());
        assert!(!info.is_valid);
        assert!(info.is_expired);
        assert!(info.expires_at.is_none());
    }

    #[test]
    fn invalid_token_still_reports_shared_waba() {
        let mut debug = debug_with(Some(0), false);
        if let Some(data) = debug.data.as_mut() {
            data.granular_scopes = vec![GranularScope {
                scope: "whatsapp_business_management".into(),
                target_ids: vec!["444".into()],
            }];
        }
        let info = access_token_information(&debug, "t", Utc::now());
        assert!(!info.is_valid);
        assert!(info.is_expired);
        assert_eq!(info.waba_id.as_deref(), Some("444"));
    }

    #[test]
    fn shared_waba_id_uses_first_whatsapp_scope() {
        let mut debug = debug_with(Some(0), true);
        if let Some(data) = debug.data.as_mut() {
            data.granular_scopes = vec![
                GranularScope {
                    scope: "business_management".into(),
                    target_ids: vec!["999".into()],
                },
                GranularScope {
                    scope: "whatsapp_business_messaging".into(),
                    target_ids: vec!["111".into(), "222".into()],
                },
                GranularScope {
                    scope: "whatsapp_business_management".into(),
                    target_ids: vec!["333".into()],
                },
            ];
        }
        assert_eq!(shared_waba_id(&debug).as_deref(), Some("111"));

        assert_eq!(shared_waba_id(&debug_with(Some(0), true)), None);
        assert_eq!(shared_waba_id(&TokenDebugResponse::default()), None);
    }

    #[test]
    fn latest_onboarded_number_ignores_unparsable_times() {
        let numbers = vec![
            phone("1", Some("2024-01-10T09:00:00+0000")),
            phone("2", Some("not a date")),
            phone("3", Some("2024-03-01T12:30:00Z")),
            phone("4", None),
        ];
        assert_eq!(most_recently_onboarded(&numbers).map(|n| n.id.as_str()), Some("3"));

        let unparsable = vec![phone("1", Some("yesterday")), phone("2", None)];
        assert!(most_recently_onboarded(&unparsable).is_none());
        assert!(most_recently_onboarded(&[]).is_none());
    }

    #[test]
    fn business_name_priority() {
        let mut waba = Waba {
            id: "w".into(),
            name: Some("WABA Name".into()),
            owner_business_info: Some(OwnerBusinessInfo {
                id: None,
                name: Some("Owner Ltd".into()),
            }),
            ..Default::default()
        };
        let mut number = phone("1", None);
        number.verified_name = Some("Verified Co".into());

        assert_eq!(resolve_business_name(Some(&number), &waba), "Verified Co");
        assert_eq!(resolve_business_name(None, &waba), "Owner Ltd");
        waba.owner_business_info = None;
        assert_eq!(resolve_business_name(None, &waba), "WABA Name");
        waba.name = None;
        assert_eq!(resolve_business_name(None, &waba), "Unknown Business");
    }

    #[tokio::test]
    async fn exchange_code_returns_bearer_token() {
        let transport = MockTransport::new().on(
            Method::POST,
            "/oauth/access_token",
            200,
            json!({"access_token": "EAAG-token", "token_type": "bearer", "expires_in": 5183944}),
        );
        let token = client(&transport)
            .exchange_code("abc123", Some("https://demo.example.com/cb"))
            .await
            .unwrap();

        assert!(!token.access_token.is_empty());
        assert_eq!(token.token_type, "bearer");

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://graph.example/oauth/access_token");
        assert_eq!(sent[0].form_value("grant_type"), Some("authorization_code"));
        assert_eq!(sent[0].form_value("code"), Some("abc123"));
        assert_eq!(sent[0].form_value("redirect_uri"), Some("https://demo.example.com/cb"));
    }

    #[tokio::test]
    async fn rejected_code_is_auth_error_with_description() {
        let transport = MockTransport::new().on(
            Method::POST,
            "/oauth/access_token",
            400,
            json!({"error": {"message": "Invalid verification code format.", "type": "OAuthException", "code": 100}}),
        );
        let err = client(&transport).exchange_code("bad", None).await.unwrap_err();
        match err {
            AppError::Auth { error, description } => {
                assert_eq!(error, "Invalid verification code format.");
                assert!(!description.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_code_fails_before_any_request() {
        let transport = MockTransport::new();
        let err = client(&transport).exchange_code("  ", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn refresh_leaves_never_expiring_token_alone() {
        let transport = MockTransport::new().on(Method::GET, "debug_token", 200, debug_body(0));
        let refreshed = client(&transport)
            .refresh_if_expired("long-lived", Duration::days(7))
            .await
            .unwrap();
        assert_eq!(refreshed.access_token, "long-lived");
        assert_eq!(refreshed.status, RefreshStatus::NeverExpires);
        assert!(transport.matching("oauth/access_token").is_empty());
    }

    #[tokio::test]
    async fn refresh_skips_extension_outside_buffer() {
        let far = (Utc::now() + Duration::days(30)).timestamp();
        let transport = MockTransport::new().on(Method::GET, "debug_token", 200, debug_body(far));
        let refreshed = client(&transport)
            .refresh_if_expired("t", Duration::days(7))
            .await
            .unwrap();
        assert_eq!(refreshed.status, RefreshStatus::NotDue);
        assert!(transport.matching("oauth/access_token").is_empty());
    }

    #[tokio::test]
    async fn refresh_extends_inside_buffer() {
        let soon = (Utc::now() + Duration::days(2)).timestamp();
        let transport = MockTransport::new()
            .on(Method::GET, "debug_token", 200, debug_body(soon))
            .on(
                Method::POST,
                "oauth/access_token",
                200,
                json!({"access_token": "fresh", "token_type": "bearer"}),
            );
        let refreshed = client(&transport)
            .refresh_if_expired("old", Duration::days(7))
            .await
            .unwrap();
        assert_eq!(refreshed.access_token, "fresh");
        assert_eq!(refreshed.status, RefreshStatus::Refreshed);
        let extend = transport.matching("oauth/access_token");
        assert_eq!(extend[0].form_value("grant_type"), Some("fb_exchange_token"));
        assert_eq!(extend[0].form_value("fb_exchange_token"), Some("old"));
    }

    #[tokio::test]
    async fn oversized_buffer_counts_as_due() {
        let far = (Utc::now() + Duration::days(30)).timestamp();
        let transport = MockTransport::new()
            .on(Method::GET, "debug_token", 200, debug_body(far))
            .on(
                Method::POST,
                "oauth/access_token",
                200,
                json!({"access_token": "fresh", "token_type": "bearer"}),
            );
        let refreshed = client(&transport)
            .refresh_if_expired("t", Duration::days(200_000_000))
            .await
            .unwrap();
        assert_eq!(refreshed.status, RefreshStatus::Refreshed);
        assert_eq!(refreshed.access_token, "fresh");
    }

    #[tokio::test]
    async fn refresh_keeps_valid_token_when_extension_fails() {
        let soon = (Utc::now() + Duration::days(2)).timestamp();
        let transport = MockTransport::new()
            .on(Method::GET, "debug_token", 200, debug_body(soon))
            .on(
                Method::POST,
                "oauth/access_token",
                400,
                json!({"error": "invalid_token"}),
            );
        let refreshed = client(&transport)
            .refresh_if_expired("old", Duration::days(7))
            .await
            .unwrap();
        assert_eq!(refreshed.access_token, "old");
        assert_eq!(refreshed.status, RefreshStatus::KeptAfterFailedExtension);
    }

    #[tokio::test]
    async fn refresh_fails_when_expired_and_extension_fails() {
        let past = (Utc::now() - Duration::days(1)).timestamp();
        let transport = MockTransport::new()
            .on(Method::GET, "debug_token", 200, debug_body(past))
            .on(Method::POST, "oauth/access_token", 200, json!({"access_token": ""}));
        let err = client(&transport)
            .refresh_if_expired("old", Duration::days(7))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[tokio::test]
    async fn waba_details_are_idempotent() {
        let transport = MockTransport::new().on(
            Method::GET,
            "/v23.0/1234?fields=",
            200,
            json!({"id": "1234", "name": "Acme", "currency": "GBP", "health_status": {"can_send_message": "AVAILABLE", "entities": []}}),
        );
        let graph = client(&transport);
        let first = graph.get_waba_details("1234").await.unwrap();
        let second = graph.get_waba_details("1234").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name.as_deref(), Some("Acme"));
        assert_eq!(transport.count(), 2);
    }

    #[tokio::test]
    async fn waba_details_error_keeps_status_and_body() {
        let transport = MockTransport::new().on(
            Method::GET,
            "/v23.0/1234",
            403,
            json!({"error": {"message": "Missing permission", "type": "OAuthException", "code": 200}}),
        );
        let err = client(&transport).get_waba_details("1234").await.unwrap_err();
        match err {
            AppError::ProviderApi {
                provider,
                status,
                code,
                details,
                ..
            } => {
                assert_eq!(provider, Provider::Meta);
                assert_eq!(status, 403);
                assert_eq!(code, Some(200));
                assert!(details.unwrap_or_default().contains("Missing permission"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn overview_tolerates_phone_number_failure() {
        let transport = MockTransport::new()
            .on(
                Method::GET,
                "debug_token",
                200,
                json!({"data": {"is_valid": true, "expires_at": 0, "granular_scopes": [
                    {"scope": "whatsapp_business_management", "target_ids": ["555"]}
                ]}}),
            )
            .on(Method::GET, "/555/phone_numbers", 500, json!({"error": {"message": "boom"}}))
            .on(Method::GET, "/555?fields=", 200, json!({"id": "555", "name": "Acme WABA"}));

        let overview = client(&transport).shared_waba_overview("user-token").await.unwrap();
        assert_eq!(overview.waba_id, "555");
        assert!(overview.phone_numbers.is_empty());
        assert_eq!(overview.business_name, "Acme WABA");
    }

    #[tokio::test]
    async fn overview_without_shared_waba_is_validation_error() {
        let transport = MockTransport::new().on(
            Method::GET,
            "debug_token",
            200,
            json!({"data": {"is_valid": true, "granular_scopes": []}}),
        );
        let err = client(&transport).shared_waba_overview("t").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn revoke_sends_credentials_in_query() {
        let transport =
            MockTransport::new().on(Method::GET, "oauth/revoke", 200, json!({"success": true}));
        assert!(client(&transport).revoke("user-token").await.unwrap());
        let sent = &transport.requests()[0];
        assert!(sent.url.contains("revoke_token=user-token"));
        assert!(sent.url.contains("client_id=app-id"));
    }
}

//! Low-level Twilio REST access.
//!
//! Owns the transport and the main account identity, builds URLs for the
//! four Twilio API hosts in use, and turns non-2xx responses into
//! `AppError::ProviderApi`. The provisioning services on top of it are free
//! functions taking `&TwilioClient` as their first argument.

use std::sync::Arc;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppError, Provider},
    http::{HttpRequest, HttpResponse, HttpTransport},
    services::credentials::Credentials,
};

pub const API_BASE: &str = "https://api.twilio.com/2010-04-01";
pub const REGULATORY_BASE: &str = "https://numbers.twilio.com/v2/RegulatoryCompliance";
pub const MESSAGING_BASE: &str = "https://messaging.twilio.com/v2";
pub const CONTENT_BASE: &str = "https://content.twilio.com/v1";

#[derive(Clone)]
pub struct TwilioClient {
    transport: Arc<dyn HttpTransport>,
    main_account_sid: String,
    main_auth_token: Option<String>,
}

/// Error body returned by every Twilio API.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    more_info: Option<String>,
}

impl TwilioClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &Config) -> Self {
        Self {
            transport,
            main_account_sid: config.twilio_account_sid.clone(),
            main_auth_token: config
                .twilio_auth_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn main_account_sid(&self) -> &str {
        &self.main_account_sid
    }

    pub fn has_main_auth_token(&self) -> bool {
        self.main_auth_token.is_some()
    }

    /// Main account acting for itself.
    pub fn main_credentials(&self) -> Result<Credentials, AppError> {
        let auth_token = self.main_auth_token.clone().ok_or_else(|| {
            AppError::AuthSetup("TWILIO_AUTH_TOKEN is not configured".to_string())
        })?;
        Ok(Credentials::Main {
            account_sid: self.main_account_sid.clone(),
            auth_token,
        })
    }

    pub fn subaccount_credentials(
        &self,
        subaccount_sid: &str,
        subaccount_token: Option<&str>,
    ) -> Result<Credentials, AppError> {
        Credentials::resolve_for_subaccount(
            subaccount_sid,
            subaccount_token,
            &self.main_account_sid,
            self.main_auth_token.as_deref(),
        )
    }

    /// Subaccount credentials when a subaccount SID is given, main otherwise.
    pub fn scoped_credentials(
        &self,
        subaccount_sid: Option<&str>,
        subaccount_token: Option<&str>,
    ) -> Result<Credentials, AppError> {
        match subaccount_sid.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sid) => self.subaccount_credentials(sid, subaccount_token),
            None => self.main_credentials(),
        }
    }

    /// `https://api.twilio.com/2010-04-01/Accounts/{account}/{path}`
    pub fn account_url(&self, account_sid: &str, path: &str) -> String {
        format!("{API_BASE}/Accounts/{account_sid}/{path}")
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        creds: &Credentials,
        url: String,
    ) -> Result<T, AppError> {
        let response = self.send(creds, HttpRequest::get(url)).await?;
        response.decode()
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        creds: &Credentials,
        url: String,
        fields: Vec<(&str, String)>,
    ) -> Result<T, AppError> {
        let response = self
            .send(creds, HttpRequest::post(url).form(fields))
            .await?;
        response.decode()
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        creds: &Credentials,
        url: String,
        body: Value,
    ) -> Result<T, AppError> {
        let response = self
            .send(creds, HttpRequest::post(url).json(body))
            .await?;
        response.decode()
    }

    pub async fn delete(&self, creds: &Credentials, url: String) -> Result<(), AppError> {
        self.send(creds, HttpRequest::delete(url)).await?;
        Ok(())
    }

    async fn send(
        &self,
        creds: &Credentials,
        request: HttpRequest,
    ) -> Result<HttpResponse, AppError> {
        let request = request.basic(creds.auth_user(), creds.auth_password());
        let response = self.transport.send(request).await?;
        ensure_success(&response)?;
        Ok(response)
    }
}

fn ensure_success(response: &HttpResponse) -> Result<(), AppError> {
    if response.is_success() {
        return Ok(());
    }

    let parsed = serde_json::from_str::<TwilioErrorBody>(&response.body).ok();
    let code = parsed.as_ref().and_then(|b| b.code);
    let more_info = parsed.as_ref().and_then(|b| b.more_info.clone());
    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("HTTP {}", response.status));

    tracing::error!(
        status = response.status,
        code = ?code,
        more_info = ?more_info,
        "Twilio API call failed: {message}"
    );

    Err(AppError::ProviderApi {
        provider: Provider::Twilio,
        status: response.status,
        code,
        message,
        details: Some(response.body.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        http::{HttpAuth, mock::MockTransport},
        test_support::test_config,
    };
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn error_body_becomes_provider_error() {
        let transport = MockTransport::new().on(
            Method::GET,
            "Accounts.json",
            401,
            json!({"code": 20003, "message": "Authenticate", "more_info": "https://www.twilio.com/docs/errors/20003", "status": 401}),
        );
        let twilio = TwilioClient::new(Arc::new(transport.clone()), &test_config());
        let creds = twilio.main_credentials().unwrap();

        let err = twilio
            .get::<Value>(&creds, format!("{API_BASE}/Accounts.json"))
            .await
            .unwrap_err();

        match err {
            AppError::ProviderApi {
                provider,
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(provider, Provider::Twilio);
                assert_eq!(status, 401);
                assert_eq!(code, Some(20003));
                assert_eq!(message, "Authenticate");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(
            transport.requests()[0].auth,
            HttpAuth::Basic {
                user: "AC_main".into(),
                password: "main-token".into()
            }
        );
    }

    #[test]
    fn scoped_credentials_fall_back_to_main() {
        let twilio = TwilioClient::new(Arc::new(MockTransport::new()), &test_config());
        let creds = twilio.scoped_credentials(None, None).unwrap();
        assert!(matches!(creds, Credentials::Main { .. }));

        let creds = twilio.scoped_credentials(Some("AC_sub"), None).unwrap();
        assert!(matches!(creds, Credentials::Delegated { .. }));
    }
}

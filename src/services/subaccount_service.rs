//! Twilio subaccount provisioning.
//!
//! Each onboarded business gets its own subaccount under the main account.
//! The subaccount is linked to the business's WABA later, when the sender
//! is registered.

use crate::{
    error::{AppError, Provider},
    models::twilio::{AvailableCountry, CountryPage, ProvisionedSubaccount, TwilioAccount},
    services::{
        credentials::Credentials,
        twilio_client::{API_BASE, TwilioClient},
    },
};

/// Create a subaccount for a business.
///
/// # Process
///
/// 1. Validate business name and WABA ID
/// 2. Create the account under the main account (`FriendlyName = business_name`)
/// 3. Resolve credentials: the subaccount's own token when Twilio returns one,
///    otherwise main account credentials scoped to the subaccount
///
/// # Errors
///
/// - `Validation`: empty business name or WABA ID
/// - `AuthSetup`: the main auth token is not configured
/// - `ProviderApi`: Twilio rejected the request or returned no SID
pub async fn create_subaccount(
    twilio: &TwilioClient,
    business_name: &str,
    waba_id: &str,
) -> Result<ProvisionedSubaccount, AppError> {
    let business_name = business_name.trim();
    let waba_id = waba_id.trim();
    if business_name.is_empty() {
        return Err(AppError::validation("Business name is required"));
    }
    if waba_id.is_empty() {
        return Err(AppError::validation("WABA ID is required"));
    }

    let main = twilio.main_credentials()?;
    tracing::info!(business = %business_name, waba_id = %waba_id, "Creating Twilio subaccount");

    let account: TwilioAccount = twilio
        .post_form(
            &main,
            format!("{API_BASE}/Accounts.json"),
            vec![("FriendlyName", business_name.to_string())],
        )
        .await?;

    let sid = account
        .sid
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ProviderApi {
            provider: Provider::Twilio,
            status: 200,
            code: None,
            message: "Subaccount creation returned no SID".to_string(),
            details: None,
        })?;

    if let Some(status) = account.status.as_deref().filter(|s| *s != "active") {
        tracing::warn!(subaccount_sid = %sid, status, "Subaccount is not active yet");
    }

    let credentials = twilio.subaccount_credentials(&sid, account.auth_token.as_deref())?;
    match &credentials {
        Credentials::Direct { .. } => {
            tracing::info!(subaccount_sid = %sid, "Subaccount created with its own auth token")
        }
        _ => tracing::info!(
            subaccount_sid = %sid,
            "Subaccount created without auth token, using main account credentials"
        ),
    }

    Ok(ProvisionedSubaccount {
        friendly_name: account
            .friendly_name
            .unwrap_or_else(|| business_name.to_string()),
        status: account.status,
        auth_token: account.auth_token.filter(|t| !t.is_empty()),
        date_created: account.date_created,
        main_account_sid: twilio.main_account_sid().to_string(),
        waba_id: waba_id.to_string(),
        authentication_method: credentials.method(),
        credentials,
        sid,
    })
}

/// Countries with numbers available to the account.
pub async fn list_available_countries(
    twilio: &TwilioClient,
    creds: &Credentials,
) -> Result<Vec<AvailableCountry>, AppError> {
    let url = twilio.account_url(creds.account_sid(), "AvailablePhoneNumbers.json");
    let page: CountryPage = twilio.get(creds, url).await?;
    tracing::info!(
        account_sid = creds.account_sid(),
        count = page.countries.len(),
        "Fetched available countries"
    );
    Ok(page.countries)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{http::mock::MockTransport, test_support::test_config};
    use reqwest::Method;
    use serde_json::json;

    fn twilio(transport: &MockTransport) -> TwilioClient {
        TwilioClient::new(Arc::new(transport.clone()), &test_config())
    }

    #[tokio::test]
    async fn subaccount_without_token_uses_delegated_credentials() {
        let transport = MockTransport::new().on(
            Method::POST,
            "/Accounts.json",
            201,
            json!({"sid": "AC_sub", "friendly_name": "Acme Ltd", "status": "active", "auth_token": null}),
        );
        let sub = create_subaccount(&twilio(&transport), "Acme Ltd", "555")
            .await
            .unwrap();

        assert_eq!(sub.sid, "AC_sub");
        assert_eq!(sub.main_account_sid, "AC_main");
        assert_eq!(sub.authentication_method, "main_account_credentials");
        assert_eq!(sub.credentials.auth_user(), "AC_main");
        assert_eq!(sub.credentials.account_sid(), "AC_sub");

        let sent = transport.requests();
        assert_eq!(sent[0].form_value("FriendlyName"), Some("Acme Ltd"));

        let json = serde_json::to_value(&sub).unwrap();
        assert!(json.get("credentials").is_none());
        assert!(!json.to_string().contains("main-token"));
    }

    #[tokio::test]
    async fn subaccount_with_token_uses_direct_credentials() {
        let transport = MockTransport::new().on(
            Method::POST,
            "/Accounts.json",
            201,
            json!({"sid": "AC_sub", "friendly_name": "Acme", "status": "active", "auth_token": "sub-token"}),
        );
        let sub = create_subaccount(&twilio(&transport), "Acme", "555")
            .await
            .unwrap();
        assert_eq!(sub.authentication_method, "subaccount_auth_token");
        assert_eq!(sub.auth_token.as_deref(), Some("sub-token"));
    }

    #[tokio::test]
    async fn missing_sid_is_provider_error() {
        let transport =
            MockTransport::new().on(Method::POST, "/Accounts.json", 201, json!({"status": "active"}));
        let err = create_subaccount(&twilio(&transport), "Acme", "555")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProviderApi { .. }));
    }

    #[tokio::test]
    async fn empty_business_name_is_rejected_before_io() {
        let transport = MockTransport::new();
        let err = create_subaccount(&twilio(&transport), " ", "555")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn countries_are_listed_for_the_subaccount() {
        let transport = MockTransport::new().on(
            Method::GET,
            "/Accounts/AC_sub/AvailablePhoneNumbers.json",
            200,
            json!({"countries": [{"country_code": "GB", "country": "United Kingdom", "beta": false,
                "subresource_uris": {"local": "/local", "mobile": "/mobile"}}]}),
        );
        let client = twilio(&transport);
        let creds = client.subaccount_credentials("AC_sub", None).unwrap();
        let countries = list_available_countries(&client, &creds).await.unwrap();
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].country_code, "GB");
    }
}

//! WhatsApp Business onboarding.
//!
//! Client library and demo server for onboarding a business onto WhatsApp
//! through Meta embedded signup and Twilio:
//!
//! - **Meta Graph API**: OAuth token exchange, refresh and revocation, WABA
//!   discovery and phone number lookup
//! - **Twilio**: subaccounts, regulatory bundles, number purchase and
//!   transfer, WhatsApp sender registration, content templates
//!
//! Every provider call goes through [`http::HttpTransport`], so the services
//! can be driven without network access.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        health, notifications, numbers, oauth, regulatory, senders, subaccounts, templates, waba,
    },
    state::AppState,
};

/// Build the HTTP router.
///
/// `/health` and the notification webhook are public. Every other route
/// goes through the operator API key middleware.
pub fn router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        // Meta embedded signup
        .route("/api/v1/signup/config", get(oauth::signup_config))
        .route("/api/v1/oauth/token", post(oauth::exchange))
        .route("/api/v1/oauth/token/extend", post(oauth::extend))
        .route("/api/v1/oauth/token/refresh", post(oauth::refresh))
        .route("/api/v1/oauth/token/revoke", post(oauth::revoke))
        .route("/api/v1/oauth/token/inspect", post(oauth::inspect))
        .route("/api/v1/waba/shared", post(waba::shared))
        .route("/api/v1/waba/{id}", get(waba::details))
        .route("/api/v1/waba/{id}/phone-numbers", get(waba::phone_numbers))
        // Twilio provisioning
        .route("/api/v1/subaccounts", post(subaccounts::create))
        .route("/api/v1/subaccounts/countries", post(subaccounts::countries))
        .route(
            "/api/v1/regulatory/requirements",
            post(regulatory::requirements),
        )
        .route("/api/v1/regulatory/bundles", post(regulatory::create_bundle))
        .route("/api/v1/phone-numbers/available", post(numbers::available))
        .route("/api/v1/phone-numbers/purchase", post(numbers::purchase))
        .route("/api/v1/senders", post(senders::register))
        // Content templates
        .route(
            "/api/v1/templates",
            get(templates::list).post(templates::create),
        )
        .route(
            "/api/v1/templates/{sid}",
            get(templates::get).delete(templates::delete),
        )
        .route(
            "/api/v1/templates/{sid}/approval",
            post(templates::submit_for_approval),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(templates::SUBACCOUNT_SID_HEADER),
            HeaderName::from_static(templates::SUBACCOUNT_TOKEN_HEADER),
        ]);

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/notifications/whatsapp",
            post(notifications::whatsapp),
        )
        .merge(authenticated_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use reqwest::Method as ClientMethod;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        http::{HttpAuth, mock::MockTransport},
        middleware::auth::hash_api_key,
        services::signature::compute_signature,
        test_support::{test_config, test_state},
    };

    const NOTIFY_URL: &str = "https://demo.example.com/api/v1/notifications/whatsapp";

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn notification(signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/notifications/whatsapp")
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(signature) = signature {
            builder = builder.header("X-Twilio-Signature", signature);
        }
        builder
            .body(Body::from("MessageSid=SM1&MessageStatus=delivered&To=whatsapp%3A%2B447400123456"))
            .unwrap()
    }

    fn notification_params() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("MessageSid".to_string(), "SM1".to_string()),
            ("MessageStatus".to_string(), "delivered".to_string()),
            ("To".to_string(), "whatsapp:+447400123456".to_string()),
        ])
    }

    #[tokio::test]
    async fn health_reports_configuration() {
        let app = router(test_state(test_config(), &MockTransport::new()));
        let request = Request::get("/health").body(Body::empty()).unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["twilio_main_token"], true);
        assert_eq!(body["data"]["operator_auth"], false);
    }

    #[tokio::test]
    async fn operator_key_is_enforced_when_configured() {
        let mut config = test_config();
        config.api_key_hash = Some(hash_api_key("operator-key"));
        let app = router(test_state(config, &MockTransport::new()));

        let missing = Request::get("/api/v1/signup/config").body(Body::empty()).unwrap();
        let (status, body) = send(app.clone(), missing).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "invalid_api_key");

        let wrong = Request::get("/api/v1/signup/config")
            .header("Authorization", "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let valid = Request::get("/api/v1/signup/config")
            .header("Authorization", "Bearer operator-key")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, valid).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["app_id"], "app-id");
        assert_eq!(body["data"]["configuration_id"], "config-id");
        assert!(body["data"].get("app_secret").is_none());
    }

    #[tokio::test]
    async fn empty_code_is_a_validation_error_without_io() {
        let transport = MockTransport::new();
        let app = router(test_state(test_config(), &transport));

        let (status, body) = send(app, json_post("/api/v1/oauth/token", json!({"code": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn out_of_range_refresh_buffer_is_rejected() {
        let transport = MockTransport::new();
        let app = router(test_state(test_config(), &transport));

        let request = json_post(
            "/api/v1/oauth/token/refresh",
            json!({"access_token": "t", "buffer_days": 200_000_000_000_i64}),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn unknown_number_type_in_requirements_is_bad_request() {
        let app = router(test_state(test_config(), &MockTransport::new()));

        let request = json_post(
            "/api/v1/regulatory/requirements",
            json!({"iso_country": "GB", "number_type": "tollfree"}),
        );
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");

        let request = json_post(
            "/api/v1/regulatory/requirements",
            json!({"iso_country": "gb", "number_type": "Mobile"}),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["requires_bundle"], true);
    }

    #[tokio::test]
    async fn purchase_into_main_account_is_rejected() {
        let transport = MockTransport::new();
        let app = router(test_state(test_config(), &transport));

        let request = json_post(
            "/api/v1/phone-numbers/purchase",
            json!({
                "subaccount_sid": "AC_main",
                "phone_number": "+447400123456",
                "business_name": "Acme Ltd",
                "country_code": "GB"
            }),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "invalid_subaccount");
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn notification_signature_is_checked() {
        let mut config = test_config();
        config.api_key_hash = Some(hash_api_key("operator-key"));
        let app = router(test_state(config, &MockTransport::new()));

        let (status, body) = send(app.clone(), notification(None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "invalid_signature");

        let (status, _) = send(app.clone(), notification(Some("AAAA"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let signature = compute_signature("main-token", NOTIFY_URL, &notification_params()).unwrap();
        let (status, body) = send(app, notification(Some(signature.as_str()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["received"], true);
    }

    #[tokio::test]
    async fn notification_validation_can_be_disabled() {
        let mut config = test_config();
        config.twilio_request_validation = false;
        let app = router(test_state(config, &MockTransport::new()));

        let (status, _) = send(app, notification(None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn template_headers_scope_the_credentials() {
        let transport = MockTransport::new().on(
            ClientMethod::GET,
            "/v1/Content",
            200,
            json!({"contents": [{"sid": "HX1"}]}),
        );
        let app = router(test_state(test_config(), &transport));

        let request = Request::get("/api/v1/templates")
            .header("X-Subaccount-Sid", "AC_sub")
            .header("X-Subaccount-Auth-Token", "sub-token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["sid"], "HX1");
        assert_eq!(
            transport.requests()[0].auth,
            HttpAuth::Basic {
                user: "AC_sub".into(),
                password: "sub-token".into()
            }
        );

        let unscoped = Request::get("/api/v1/templates").body(Body::empty()).unwrap();
        let (status, _) = send(app, unscoped).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            transport.requests()[1].auth,
            HttpAuth::Basic {
                user: "AC_main".into(),
                password: "main-token".into()
            }
        );
    }

    #[tokio::test]
    async fn sender_webhook_defaults_to_notification_endpoint() {
        let transport = MockTransport::new().on(
            ClientMethod::POST,
            "/Channels/Senders",
            201,
            json!({"sid": "XE1", "status": "CREATING"}),
        );
        let app = router(test_state(test_config(), &transport));

        let request = json_post(
            "/api/v1/senders",
            json!({
                "subaccount_sid": "AC_sub",
                "phone_number": "+447400123456",
                "business_name": "Acme Ltd",
                "waba_id": "555"
            }),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sid"], "XE1");

        let crate::http::HttpBody::Json(sent) = &transport.requests()[0].body else {
            panic!("expected JSON body");
        };
        assert_eq!(sent["webhook"]["callback_url"], NOTIFY_URL);
    }
}

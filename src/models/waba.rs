//! WhatsApp Business Account (WABA) models read from the Graph API.

use serde::{Deserialize, Serialize};

/// WABA details as returned by `GET /{waba_id}?fields=...`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Waba {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub timezone_id: Option<String>,
    #[serde(default)]
    pub message_template_namespace: Option<String>,
    #[serde(default)]
    pub account_review_status: Option<String>,
    #[serde(default)]
    pub business_verification_status: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub owner_business_info: Option<OwnerBusinessInfo>,
    #[serde(default)]
    pub primary_business_location: Option<String>,
    #[serde(default)]
    pub purchase_order_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub health_status: Option<HealthStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OwnerBusinessInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Messaging health. `can_send_message` is `AVAILABLE`, `LIMITED` or `BLOCKED`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HealthStatus {
    #[serde(default)]
    pub can_send_message: Option<String>,
    #[serde(default)]
    pub entities: Vec<HealthEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HealthEntity {
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub can_send_message: Option<String>,
    #[serde(default)]
    pub errors: Vec<HealthError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HealthError {
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub possible_solution: Option<String>,
}

/// Phone number attached to a WABA.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WabaPhoneNumber {
    pub id: String,
    #[serde(default)]
    pub verified_name: Option<String>,
    #[serde(default)]
    pub display_phone_number: Option<String>,
    #[serde(default)]
    pub quality_rating: Option<String>,
    #[serde(default)]
    pub code_verification_status: Option<String>,
    #[serde(default)]
    pub platform_type: Option<String>,
    #[serde(default)]
    pub throughput: Option<Throughput>,
    /// Graph timestamp such as `2024-05-01T10:00:00+0000`.
    #[serde(default)]
    pub last_onboarded_time: Option<String>,
    #[serde(default)]
    pub webhook_configuration: Option<WebhookConfiguration>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Throughput {
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WebhookConfiguration {
    #[serde(default)]
    pub application: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PhoneNumberList {
    #[serde(default)]
    pub data: Vec<WabaPhoneNumber>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Paging {
    #[serde(default)]
    pub cursors: Option<Cursors>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Cursors {
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

/// Everything the onboarding front end needs after signup completes.
#[derive(Debug, Clone, Serialize)]
pub struct WabaOverview {
    pub waba_id: String,
    pub waba: Waba,
    pub phone_numbers: Vec<WabaPhoneNumber>,
    pub latest_phone_number: Option<WabaPhoneNumber>,
    pub business_name: String,
}

/// Phone numbers plus the one onboarded last.
#[derive(Debug, Clone, Serialize)]
pub struct WabaPhoneNumbers {
    pub phone_numbers: PhoneNumberList,
    pub latest_phone_number: Option<WabaPhoneNumber>,
}

//! Twilio provisioning models.
//!
//! Wire types mirror the JSON Twilio returns (snake_case keys). Request types
//! are the JSON bodies accepted by the demo server's provisioning endpoints.
//!
//! # Provisioning Flow
//!
//! 1. Create a subaccount per business
//! 2. Create and submit a regulatory bundle where the country requires one
//! 3. Purchase a number (transferring it to the subaccount when bought under the main account)
//! 4. Register the number as a WhatsApp sender linked to the business's WABA

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::outcome::StepOutcome, services::credentials::Credentials};

/// Number category used by Twilio's availability and regulatory APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberType {
    Local,
    Mobile,
}

impl NumberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberType::Local => "local",
            NumberType::Mobile => "mobile",
        }
    }

    /// Resource name under `AvailablePhoneNumbers/{country}/`.
    pub fn resource(&self) -> &'static str {
        match self {
            NumberType::Local => "Local",
            NumberType::Mobile => "Mobile",
        }
    }
}

impl fmt::Display for NumberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumberType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(NumberType::Local),
            "mobile" => Ok(NumberType::Mobile),
            other => Err(AppError::validation(format!(
                "Unsupported number type `{other}`, expected `local` or `mobile`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndUserType {
    #[default]
    Business,
    Individual,
}

impl EndUserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndUserType::Business => "business",
            EndUserType::Individual => "individual",
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioAccount {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableCountry {
    pub country_code: String,
    pub country: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub beta: bool,
    #[serde(default)]
    pub subresource_uris: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountryPage {
    #[serde(default)]
    pub countries: Vec<AvailableCountry>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RawCapabilities {
    #[serde(default)]
    pub voice: bool,
    #[serde(default, rename = "SMS")]
    pub sms: bool,
    #[serde(default, rename = "MMS")]
    pub mms: bool,
    #[serde(default)]
    pub fax: bool,
}

/// Twilio sends coordinates as strings.
#[derive(Debug, Deserialize)]
pub(crate) struct RawAvailableNumber {
    #[serde(default)]
    pub friendly_name: Option<String>,
    pub phone_number: String,
    #[serde(default)]
    pub lata: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub rate_center: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub iso_country: Option<String>,
    #[serde(default)]
    pub address_requirements: Option<String>,
    #[serde(default)]
    pub beta: bool,
    #[serde(default)]
    pub capabilities: RawCapabilities,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailableNumberPage {
    #[serde(default)]
    pub available_phone_numbers: Vec<RawAvailableNumber>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AvailablePhoneNumber {
    pub friendly_name: String,
    pub phone_number: String,
    pub lata: Option<String>,
    pub locality: Option<String>,
    pub rate_center: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub iso_country: Option<String>,
    pub address_requirements: Option<String>,
    pub beta: bool,
    /// Subset of `voice`, `sms`, `mms`, `fax`.
    pub capabilities: Vec<String>,
}

impl From<RawAvailableNumber> for AvailablePhoneNumber {
    fn from(raw: RawAvailableNumber) -> Self {
        let caps = &raw.capabilities;
        let capabilities = [
            (caps.voice, "voice"),
            (caps.sms, "sms"),
            (caps.mms, "mms"),
            (caps.fax, "fax"),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, name)| name.to_string())
        .collect();

        Self {
            friendly_name: raw
                .friendly_name
                .unwrap_or_else(|| raw.phone_number.clone()),
            phone_number: raw.phone_number,
            lata: raw.lata,
            locality: raw.locality,
            rate_center: raw.rate_center,
            latitude: raw.latitude.and_then(|v| v.parse().ok()),
            longitude: raw.longitude.and_then(|v| v.parse().ok()),
            region: raw.region,
            postal_code: raw.postal_code,
            iso_country: raw.iso_country,
            address_requirements: raw.address_requirements,
            beta: raw.beta,
            capabilities,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomingPhoneNumber {
    pub sid: String,
    pub phone_number: String,
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub bundle_sid: Option<String>,
}

/// Regulatory bundle. Status moves `draft` → `pending-review` →
/// `twilio-approved` or `twilio-rejected`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegulatoryBundle {
    pub sid: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub iso_country: Option<String>,
    #[serde(default)]
    pub number_type: Option<String>,
    #[serde(default)]
    pub end_user_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndUser {
    pub sid: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupportingDocument {
    pub sid: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemAssignment {
    pub sid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisteredSender {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Service results
// ---------------------------------------------------------------------------

/// Result of subaccount creation. The main auth token stays inside
/// `credentials` and is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedSubaccount {
    pub sid: String,
    pub friendly_name: String,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    pub date_created: Option<String>,
    pub main_account_sid: String,
    pub waba_id: String,
    pub authentication_method: &'static str,
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BundleRequirement {
    pub requires_bundle: bool,
    pub supported_country: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleCreation {
    pub bundle: RegulatoryBundle,
    pub end_users: Vec<EndUser>,
    pub documents: Vec<SupportingDocument>,
    pub steps: Vec<StepOutcome>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Bought directly under the subaccount.
    NotNeeded,
    Transferred,
    /// Transfer only succeeded after dropping a bundle Twilio could not find.
    TransferredWithoutBundle,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub phone_number: IncomingPhoneNumber,
    pub owner_account_sid: String,
    pub bundle_sid: Option<String>,
    pub transfer: TransferStatus,
    pub steps: Vec<StepOutcome>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// # Example
///
/// ```json
/// {
///   "business_name": "Acme Ltd",
///   "waba_id": "104996822345678"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateSubaccountRequest {
    pub business_name: String,
    pub waba_id: String,
}

/// Identifies the subaccount a call runs under.
#[derive(Debug, Deserialize)]
pub struct SubaccountRef {
    pub subaccount_sid: String,
    #[serde(default)]
    pub subaccount_auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequirementsRequest {
    pub iso_country: String,
    pub number_type: String,
}

/// Business and authorized-contact details for a regulatory bundle.
///
/// GB bundles additionally need the registration number, full address and
/// every contact field.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateBundleRequest {
    pub subaccount_sid: String,
    #[serde(default)]
    pub subaccount_auth_token: Option<String>,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub iso_country: String,
    #[serde(default)]
    pub end_user_type: EndUserType,
    pub number_type: String,

    #[serde(default)]
    pub business_registration_number: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub business_industry: Option<String>,
    #[serde(default)]
    pub business_address: Option<String>,
    #[serde(default)]
    pub business_city: Option<String>,
    #[serde(default)]
    pub business_state: Option<String>,
    #[serde(default)]
    pub business_postal_code: Option<String>,
    #[serde(default)]
    pub business_website: Option<String>,

    #[serde(default)]
    pub authorized_contact_first_name: Option<String>,
    #[serde(default)]
    pub authorized_contact_last_name: Option<String>,
    #[serde(default)]
    pub authorized_contact_email: Option<String>,
    #[serde(default)]
    pub authorized_contact_phone: Option<String>,
    #[serde(default)]
    pub authorized_contact_date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub authorized_contact_job_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableNumbersRequest {
    pub subaccount_sid: String,
    #[serde(default)]
    pub subaccount_auth_token: Option<String>,
    pub country_code: String,
    pub number_type: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    pub subaccount_sid: String,
    #[serde(default)]
    pub subaccount_auth_token: Option<String>,
    pub phone_number: String,
    pub business_name: String,
    pub country_code: String,
    /// Overrides the configured bundle table.
    #[serde(default)]
    pub bundle_sid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterSenderRequest {
    pub subaccount_sid: String,
    #[serde(default)]
    pub subaccount_auth_token: Option<String>,
    pub phone_number: String,
    pub business_name: String,
    pub waba_id: String,
    /// Defaults to this server's notification endpoint.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_type_parses_case_insensitively() {
        assert_eq!("MOBILE".parse::<NumberType>().unwrap(), NumberType::Mobile);
        assert_eq!(" Local ".parse::<NumberType>().unwrap(), NumberType::Local);
        assert!(matches!(
            "tollfree".parse::<NumberType>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn available_number_maps_capabilities_and_coordinates() {
        let raw: RawAvailableNumber = serde_json::from_str(
            r#"{"friendly_name":"07400 123456","phone_number":"+447400123456",
                "latitude":"51.5072","longitude":null,"iso_country":"GB","beta":false,
                "capabilities":{"voice":true,"SMS":true,"MMS":false,"fax":false}}"#,
        )
        .unwrap();
        let number = AvailablePhoneNumber::from(raw);
        assert_eq!(number.capabilities, vec!["voice", "sms"]);
        assert_eq!(number.latitude, Some(51.5072));
        assert_eq!(number.longitude, None);
    }
}

//! Content template models (Twilio Content API).

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentTemplate {
    pub sid: String,
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub variables: Value,
    /// Keyed by content type, e.g. `twilio/text` or `twilio/quick-reply`.
    #[serde(default)]
    pub types: Value,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPage {
    #[serde(default)]
    pub contents: Vec<ContentTemplate>,
}

/// Body of `POST /api/v1/templates`, forwarded to Twilio as JSON.
///
/// # Example
///
/// ```json
/// {
///   "friendly_name": "order_update",
///   "language": "en",
///   "variables": { "1": "Order number" },
///   "types": { "twilio/text": { "body": "Your order {{1}} has shipped" } }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub friendly_name: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    pub types: Value,
}

/// WhatsApp template category accepted by the approval endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemplateCategory {
    Utility,
    Marketing,
    Authentication,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Utility => "UTILITY",
            TemplateCategory::Marketing => "MARKETING",
            TemplateCategory::Authentication => "AUTHENTICATION",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UTILITY" => Ok(TemplateCategory::Utility),
            "MARKETING" => Ok(TemplateCategory::Marketing),
            "AUTHENTICATION" => Ok(TemplateCategory::Authentication),
            other => Err(AppError::validation(format!(
                "Unsupported template category `{other}`, expected UTILITY, MARKETING or AUTHENTICATION"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    #[serde(default)]
    pub name: String,
    pub category: String,
}

/// WhatsApp approval state returned by Twilio after submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedTemplate {
    pub sid: String,
    pub deleted: bool,
}

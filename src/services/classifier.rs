//! Number classification and regulatory bundle lookup.
//!
//! The mobile/local split is a length-and-prefix heuristic for UK numbers: a
//! `+44` number longer than 13 characters is treated as mobile. It is an
//! approximation and should be replaced by Twilio Lookup data if numbers from
//! other countries start being purchased.

use std::collections::HashMap;

use crate::{config::Config, models::twilio::NumberType};

#[derive(Debug, Clone)]
pub struct NumberClassifier {
    mobile_bundles: HashMap<String, String>,
    local_bundles: HashMap<String, String>,
    mobile_prefix: String,
    mobile_min_len: usize,
}

impl NumberClassifier {
    pub fn new(
        mobile_bundles: HashMap<String, String>,
        local_bundles: HashMap<String, String>,
    ) -> Self {
        Self {
            mobile_bundles,
            local_bundles,
            mobile_prefix: "+44".to_string(),
            mobile_min_len: 14,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.regulatory_bundles_mobile.clone(),
            config.regulatory_bundles_local.clone(),
        )
    }

    pub fn classify(&self, phone_number: &str) -> NumberType {
        let number = phone_number.trim();
        if number.starts_with(&self.mobile_prefix) && number.len() >= self.mobile_min_len {
            NumberType::Mobile
        } else {
            NumberType::Local
        }
    }

    /// Configured bundle SID for the country and the number's classified type.
    pub fn bundle_for(&self, country: &str, phone_number: &str) -> Option<&str> {
        let table = match self.classify(phone_number) {
            NumberType::Mobile => &self.mobile_bundles,
            NumberType::Local => &self.local_bundles,
        };
        table
            .get(&country.trim().to_uppercase())
            .map(String::as_str)
    }
}

//! Twilio request signature validation.
//!
//! Twilio signs each callback with `X-Twilio-Signature`: the base64 HMAC-SHA1,
//! keyed with the account auth token, of the full callback URL followed by
//! every POST parameter as `key` + `value`, sorted by key.

use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::AppError;

type HmacSha1 = Hmac<Sha1>;

fn signed_mac(
    auth_token: &str,
    url: &str,
    params: &BTreeMap<String, String>,
) -> Result<HmacSha1, AppError> {
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())
        .map_err(|e| AppError::AuthSetup(format!("invalid HMAC key: {e}")))?;
    mac.update(url.as_bytes());
    for (key, value) in params {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Ok(mac)
}

/// Expected `X-Twilio-Signature` value.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, AppError> {
    let mac = signed_mac(auth_token, url, params)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a provided signature in constant time.
pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &BTreeMap<String, String>,
    signature: &str,
) -> Result<bool, AppError> {
    let Ok(provided) = STANDARD.decode(signature.trim()) else {
        return Ok(false);
    };
    let mac = signed_mac(auth_token, url, params)?;
    Ok(mac.verify_slice(&provided).is_ok())
}

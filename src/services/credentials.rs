//! Credential resolution for Twilio calls.
//!
//! Subaccounts created through the API usually come back without their own
//! auth token. Calls on their behalf then authenticate with the main account
//! SID and token while targeting the subaccount SID in the URL path.

use std::fmt;

use crate::error::AppError;

/// Credentials used for one Twilio call.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// The main account acting for itself.
    Main {
        account_sid: String,
        auth_token: String,
    },
    /// A subaccount with its own auth token.
    Direct {
        subaccount_sid: String,
        auth_token: String,
    },
    /// Main account credentials scoped to a subaccount.
    Delegated {
        main_account_sid: String,
        main_auth_token: String,
        subaccount_sid: String,
    },
}

impl Credentials {
    /// Basic auth username.
    pub fn auth_user(&self) -> &str {
        match self {
            Credentials::Main { account_sid, .. } => account_sid,
            Credentials::Direct { subaccount_sid, .. } => subaccount_sid,
            Credentials::Delegated {
                main_account_sid, ..
            } => main_account_sid,
        }
    }

    /// Basic auth password.
    pub fn auth_password(&self) -> &str {
        match self {
            Credentials::Main { auth_token, .. } | Credentials::Direct { auth_token, .. } => {
                auth_token
            }
            Credentials::Delegated {
                main_auth_token, ..
            } => main_auth_token,
        }
    }

    /// Account the call acts on (the `Accounts/{sid}` path segment).
    pub fn account_sid(&self) -> &str {
        match self {
            Credentials::Main { account_sid, .. } => account_sid,
            Credentials::Direct { subaccount_sid, .. }
            | Credentials::Delegated { subaccount_sid, .. } => subaccount_sid,
        }
    }

    /// Label reported to API callers instead of any secret.
    pub fn method(&self) -> &'static str {
        match self {
            Credentials::Main { .. } => "main_account",
            Credentials::Direct { .. } => "subaccount_auth_token",
            Credentials::Delegated { .. } => "main_account_credentials",
        }
    }

    /// Pick the credential path for a subaccount.
    ///
    /// # Rules
    ///
    /// 1. A non-empty subaccount token that differs from the main token → `Direct`
    /// 2. Otherwise, main token configured → `Delegated`
    /// 3. Otherwise → `AuthSetup`
    pub fn resolve_for_subaccount(
        subaccount_sid: &str,
        subaccount_token: Option<&str>,
        main_account_sid: &str,
        main_auth_token: Option<&str>,
    ) -> Result<Self, AppError> {
        let own_token = subaccount_token
            .map(str::trim)
            .filter(|t| !t.is_empty() && Some(*t) != main_auth_token);

        if let Some(token) = own_token {
            return Ok(Credentials::Direct {
                subaccount_sid: subaccount_sid.to_string(),
                auth_token: token.to_string(),
            });
        }

        match main_auth_token.filter(|t| !t.is_empty()) {
            Some(main_token) => Ok(Credentials::Delegated {
                main_account_sid: main_account_sid.to_string(),
                main_auth_token: main_token.to_string(),
                subaccount_sid: subaccount_sid.to_string(),
            }),
            None => Err(AppError::AuthSetup(format!(
                "Subaccount {subaccount_sid} has no auth token and the main account auth token is not configured"
            ))),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Main { account_sid, .. } => f
                .debug_struct("Main")
                .field("account_sid", account_sid)
                .field("auth_token", &"***")
                .finish(),
            Credentials::Direct { subaccount_sid, .. } => f
                .debug_struct("Direct")
                .field("subaccount_sid", subaccount_sid)
                .field("auth_token", &"***")
                .finish(),
            Credentials::Delegated {
                main_account_sid,
                subaccount_sid,
                ..
            } => f
                .debug_struct("Delegated")
                .field("main_account_sid", main_account_sid)
                .field("main_auth_token", &"***")
                .field("subaccount_sid", subaccount_sid)
                .finish(),
        }
    }
}

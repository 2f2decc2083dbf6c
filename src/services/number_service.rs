//! Phone number search, purchase and transfer.
//!
//! # Purchase Paths
//!
//! - **Subaccount has its own token**: the number is bought directly under
//!   the subaccount; nothing is transferred.
//! - **Delegated credentials**: the number is bought under the main account
//!   and then moved to the subaccount by updating its `AccountSid`.
//!
//! A regulatory bundle is attached when the caller supplies one or when the
//! configured tables have one for the country and classified number type.

use crate::{
    error::AppError,
    models::{
        outcome::StepOutcome,
        twilio::{
            AvailableNumberPage, AvailablePhoneNumber, IncomingPhoneNumber, NumberType,
            PurchaseOutcome, PurchaseRequest, TransferStatus,
        },
    },
    services::{classifier::NumberClassifier, credentials::Credentials, twilio_client::TwilioClient},
};

/// Twilio message fragment returned when a transfer references a bundle the
/// target account cannot see.
const BUNDLE_NOT_FOUND: &str = "Bundle not found";

/// Numbers available for purchase in a country.
///
/// An unrecognised number type yields an empty list without calling Twilio.
pub async fn list_available(
    twilio: &TwilioClient,
    creds: &Credentials,
    country_code: &str,
    number_type: &str,
    limit: u32,
) -> Result<Vec<AvailablePhoneNumber>, AppError> {
    let Ok(number_type) = number_type.parse::<NumberType>() else {
        tracing::warn!(number_type, "Unsupported number type requested, returning no numbers");
        return Ok(Vec::new());
    };

    let country = country_code.trim().to_uppercase();
    if country.is_empty() {
        return Err(AppError::validation("Country code is required"));
    }

    let url = format!(
        "{}?PageSize={}",
        twilio.account_url(
            creds.account_sid(),
            &format!("AvailablePhoneNumbers/{country}/{}.json", number_type.resource())
        ),
        limit.max(1)
    );
    let page: AvailableNumberPage = twilio.get(creds, url).await?;

    tracing::info!(
        country = %country,
        number_type = %number_type,
        count = page.available_phone_numbers.len(),
        "Fetched available phone numbers"
    );

    Ok(page
        .available_phone_numbers
        .into_iter()
        .map(AvailablePhoneNumber::from)
        .collect())
}

/// Buy a number for a subaccount.
///
/// # Process
///
/// 1. Reject the main account SID as the target subaccount
/// 2. Resolve credentials and pick the bundle
/// 3. Buy the number (under the subaccount for `Direct`, the main account otherwise)
/// 4. Delegated only: transfer the number to the subaccount, retrying once
///    without the bundle if Twilio reports `Bundle not found`
///
/// # Errors
///
/// - `InvalidSubaccount`: `subaccount_sid` is the main account SID
/// - `AuthSetup`: no usable credentials
/// - `ProviderApi`: purchase failed, or transfer failed (for a failed retry,
///   the original bundle-attached error is returned)
pub async fn purchase(
    twilio: &TwilioClient,
    classifier: &NumberClassifier,
    request: &PurchaseRequest,
) -> Result<PurchaseOutcome, AppError> {
    let subaccount_sid = request.subaccount_sid.trim();
    let phone_number = request.phone_number.trim();

    if subaccount_sid.is_empty() {
        return Err(AppError::validation("Subaccount SID is required"));
    }
    if phone_number.is_empty() {
        return Err(AppError::validation("Phone number is required"));
    }
    if subaccount_sid == twilio.main_account_sid() {
        tracing::error!(subaccount_sid, "Main account SID supplied as subaccount SID");
        return Err(AppError::InvalidSubaccount(format!(
            "{subaccount_sid} is the main account SID, expected a subaccount SID"
        )));
    }

    let creds =
        twilio.subaccount_credentials(subaccount_sid, request.subaccount_auth_token.as_deref())?;

    let bundle_sid = request
        .bundle_sid
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .or_else(|| classifier.bundle_for(&request.country_code, phone_number))
        .map(str::to_string);

    tracing::info!(
        phone_number,
        subaccount_sid,
        country = %request.country_code,
        bundle_sid = bundle_sid.as_deref().unwrap_or("none"),
        method = creds.method(),
        "Purchasing phone number"
    );

    let buyer = match &creds {
        Credentials::Direct { .. } => creds.clone(),
        _ => twilio.main_credentials()?,
    };

    let mut fields = vec![
        ("PhoneNumber", phone_number.to_string()),
        ("FriendlyName", request.business_name.trim().to_string()),
    ];
    if let Some(bundle) = &bundle_sid {
        fields.push(("BundleSid", bundle.clone()));
    }

    let purchased: IncomingPhoneNumber = twilio
        .post_form(
            &buyer,
            twilio.account_url(buyer.account_sid(), "IncomingPhoneNumbers.json"),
            fields,
        )
        .await?;

    let mut steps = vec![StepOutcome::completed("purchase", &purchased.sid)];

    if matches!(creds, Credentials::Direct { .. }) {
        steps.push(StepOutcome::skipped(
            "transfer",
            "purchased directly under the subaccount",
        ));
        return Ok(PurchaseOutcome {
            owner_account_sid: subaccount_sid.to_string(),
            phone_number: purchased,
            bundle_sid,
            transfer: TransferStatus::NotNeeded,
            steps,
        });
    }

    let transfer = transfer_to_subaccount(
        twilio,
        &buyer,
        &purchased.sid,
        subaccount_sid,
        bundle_sid.as_deref(),
        &mut steps,
    )
    .await?;

    tracing::info!(
        phone_number_sid = %purchased.sid,
        subaccount_sid,
        transfer = ?transfer,
        "Phone number provisioned"
    );

    Ok(PurchaseOutcome {
        owner_account_sid: subaccount_sid.to_string(),
        phone_number: IncomingPhoneNumber {
            account_sid: Some(subaccount_sid.to_string()),
            ..purchased
        },
        bundle_sid,
        transfer,
        steps,
    })
}

async fn transfer_to_subaccount(
    twilio: &TwilioClient,
    main: &Credentials,
    phone_number_sid: &str,
    subaccount_sid: &str,
    bundle_sid: Option<&str>,
    steps: &mut Vec<StepOutcome>,
) -> Result<TransferStatus, AppError> {
    let url = twilio.account_url(
        main.account_sid(),
        &format!("IncomingPhoneNumbers/{phone_number_sid}.json"),
    );

    let mut fields = vec![("AccountSid", subaccount_sid.to_string())];
    if let Some(bundle) = bundle_sid {
        fields.push(("BundleSid", bundle.to_string()));
    }

    let first: Result<IncomingPhoneNumber, AppError> =
        twilio.post_form(main, url.clone(), fields).await;

    let original = match first {
        Ok(_) => {
            steps.push(StepOutcome::completed("transfer", phone_number_sid));
            return Ok(TransferStatus::Transferred);
        }
        Err(err) => err,
    };

    let bundle_missing = bundle_sid.is_some()
        && original
            .provider_message()
            .is_some_and(|m| m.contains(BUNDLE_NOT_FOUND));
    if !bundle_missing {
        tracing::error!(phone_number_sid, subaccount_sid, "Transfer failed: {original}");
        return Err(original);
    }

    tracing::warn!(
        phone_number_sid,
        bundle_sid = bundle_sid.unwrap_or_default(),
        "Bundle not visible to subaccount, retrying transfer without it"
    );
    steps.push(StepOutcome::failed("transfer_with_bundle", original.to_string()));

    let retry: Result<IncomingPhoneNumber, AppError> = twilio
        .post_form(main, url, vec![("AccountSid", subaccount_sid.to_string())])
        .await;

    match retry {
        Ok(_) => {
            tracing::warn!(
                phone_number_sid,
                "Number transferred without regulatory bundle, compliance needs manual follow-up"
            );
            steps.push(StepOutcome::completed("transfer_without_bundle", phone_number_sid));
            Ok(TransferStatus::TransferredWithoutBundle)
        }
        Err(retry_err) => {
            tracing::error!(phone_number_sid, "Transfer retry without bundle failed: {retry_err}");
            Err(original)
        }
    }
}

//! Regulatory bundle requirements and creation.
//!
//! Some countries only allow number purchases once the business has been
//! verified through a regulatory bundle: end users (the business and an
//! authorized contact) plus supporting documents, submitted for review.
//!
//! # Bundle Status
//!
//! `draft` → `pending-review` → `twilio-approved` | `twilio-rejected`

use serde_json::{Value, json};

use crate::{
    error::AppError,
    models::{
        outcome::StepOutcome,
        twilio::{
            BundleCreation, BundleRequirement, CreateBundleRequest, EndUser, ItemAssignment,
            NumberType, RegulatoryBundle, SupportingDocument,
        },
    },
    services::{
        credentials::Credentials,
        twilio_client::{REGULATORY_BASE, TwilioClient},
    },
};

const DEFAULT_BUSINESS_TYPE: &str = "corporation";
const DEFAULT_BUSINESS_INDUSTRY: &str = "technology";
const DEFAULT_JOB_TITLE: &str = "Authorized Representative";

/// Whether a country needs a bundle before numbers can be bought there.
///
/// Pure lookup against the configured country list; no provider call.
///
/// # Errors
///
/// `Validation` when the number type is not `local` or `mobile`.
pub fn check_requirements(
    bundle_countries: &[String],
    iso_country: &str,
    number_type: &str,
) -> Result<BundleRequirement, AppError> {
    let number_type: NumberType = number_type.parse()?;
    let country = iso_country.trim().to_uppercase();
    if country.is_empty() {
        return Err(AppError::validation("ISO country is required"));
    }

    let requires_bundle = bundle_countries.iter().any(|c| *c == country);
    let message = if requires_bundle {
        format!(
            "{country} {number_type} numbers require a regulatory bundle with business information."
        )
    } else {
        format!("Regulatory bundles are not supported yet for {country}.")
    };

    Ok(BundleRequirement {
        requires_bundle,
        supported_country: requires_bundle,
        message,
    })
}

/// Check a bundle request before anything is sent to Twilio.
///
/// GB needs the full business address, registration number and contact.
pub fn validate_bundle_request(request: &CreateBundleRequest) -> Result<NumberType, AppError> {
    let number_type: NumberType = request.number_type.parse()?;

    if request.business_name.trim().is_empty() {
        return Err(AppError::validation("Business name is required"));
    }
    if request.iso_country.trim().is_empty() {
        return Err(AppError::validation("ISO country is required"));
    }

    if request.iso_country.trim().eq_ignore_ascii_case("GB") {
        let required = [
            (&request.business_registration_number, "Business registration number"),
            (&request.business_address, "Business address"),
            (&request.business_city, "Business city"),
            (&request.business_postal_code, "Business postal code"),
            (&request.authorized_contact_first_name, "Authorized contact first name"),
            (&request.authorized_contact_last_name, "Authorized contact last name"),
            (&request.authorized_contact_email, "Authorized contact email"),
            (&request.authorized_contact_phone, "Authorized contact phone"),
        ];
        if let Some((_, label)) = required
            .iter()
            .find(|(value, _)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        {
            return Err(AppError::validation(format!(
                "{label} is required for GB regulatory bundles"
            )));
        }
    }

    Ok(number_type)
}

/// Create, populate and submit a regulatory bundle.
///
/// # Process
///
/// 1. Validate the request (no provider call on failure)
/// 2. Create the bundle
/// 3. Create the business end user and the authorized contact end user
/// 4. GB only: create the business registration, proof of address and
///    identity documents
/// 5. Assign every end user and document to the bundle (best effort)
/// 6. Submit the bundle for review
///
/// Failures in steps 2-4 and 6 abort the flow. Assignment failures are
/// recorded in the returned steps.
pub async fn create_bundle(
    twilio: &TwilioClient,
    creds: &Credentials,
    request: &CreateBundleRequest,
) -> Result<BundleCreation, AppError> {
    let number_type = validate_bundle_request(request)?;
    let country = request.iso_country.trim().to_uppercase();
    let business = request.business_name.trim();
    let end_user_type = request.end_user_type.as_str();
    let mut steps = Vec::new();

    tracing::info!(
        business = %business,
        country = %country,
        end_user_type,
        number_type = %number_type,
        "Creating regulatory bundle"
    );

    // Step 1: bundle
    let bundle: RegulatoryBundle = twilio
        .post_form(
            creds,
            format!("{REGULATORY_BASE}/Bundles"),
            vec![
                (
                    "FriendlyName",
                    format!("{business} - {country} {end_user_type} {number_type} Bundle"),
                ),
                ("Email", opt(&request.authorized_contact_email).to_string()),
                ("IsoCountry", country.clone()),
                ("EndUserType", end_user_type.to_string()),
                ("NumberType", number_type.to_string()),
            ],
        )
        .await?;
    steps.push(StepOutcome::completed("create_bundle", &bundle.sid));

    // Step 2: end users
    let business_user = create_end_user(
        twilio,
        creds,
        format!("{business} Business Address"),
        "business",
        business_attributes(request, &country),
    )
    .await?;
    steps.push(StepOutcome::completed("create_business_end_user", &business_user.sid));

    let contact = create_end_user(
        twilio,
        creds,
        format!(
            "{} {}",
            opt(&request.authorized_contact_first_name),
            opt(&request.authorized_contact_last_name)
        ),
        "individual",
        contact_attributes(request),
    )
    .await?;
    steps.push(StepOutcome::completed("create_contact_end_user", &contact.sid));

    let end_users = vec![business_user, contact];

    // Step 3: supporting documents
    let mut documents = Vec::new();
    if country == "GB" {
        for (friendly_name, kind, attributes) in gb_documents(request, &country) {
            let document = create_document(twilio, creds, friendly_name, kind, attributes).await?;
            steps.push(StepOutcome::completed(format!("create_document_{kind}"), &document.sid));
            documents.push(document);
        }
    } else {
        steps.push(StepOutcome::skipped(
            "create_documents",
            format!("no supporting documents defined for {country}"),
        ));
    }

    // Step 4: assignments, best effort
    let object_sids = end_users
        .iter()
        .map(|u| u.sid.as_str())
        .chain(documents.iter().map(|d| d.sid.as_str()));
    for object_sid in object_sids {
        let step = format!("assign_{object_sid}");
        let assigned: Result<ItemAssignment, AppError> = twilio
            .post_form(
                creds,
                format!("{REGULATORY_BASE}/Bundles/{}/ItemAssignments", bundle.sid),
                vec![("ObjectSid", object_sid.to_string())],
            )
            .await;
        match assigned {
            Ok(assignment) => steps.push(StepOutcome::completed(step, assignment.sid)),
            Err(err) => {
                tracing::warn!(bundle_sid = %bundle.sid, object_sid, "Item assignment failed: {err}");
                steps.push(StepOutcome::failed(step, err.to_string()));
            }
        }
    }

    // Step 5: submit
    let submitted: RegulatoryBundle = twilio
        .post_form(
            creds,
            format!("{REGULATORY_BASE}/Bundles/{}", bundle.sid),
            vec![("Status", "pending-review".to_string())],
        )
        .await?;
    steps.push(StepOutcome::completed("submit_for_review", &submitted.sid));

    tracing::info!(
        bundle_sid = %submitted.sid,
        status = submitted.status.as_deref().unwrap_or("unknown"),
        "Regulatory bundle submitted for review"
    );

    Ok(BundleCreation {
        bundle: RegulatoryBundle {
            iso_country: Some(country),
            number_type: Some(number_type.to_string()),
            end_user_type: Some(end_user_type.to_string()),
            ..submitted
        },
        end_users,
        documents,
        steps,
    })
}

async fn create_end_user(
    twilio: &TwilioClient,
    creds: &Credentials,
    friendly_name: String,
    kind: &str,
    attributes: Value,
) -> Result<EndUser, AppError> {
    twilio
        .post_form(
            creds,
            format!("{REGULATORY_BASE}/EndUsers"),
            vec![
                ("FriendlyName", friendly_name),
                ("Type", kind.to_string()),
                ("Attributes", attributes.to_string()),
            ],
        )
        .await
}

async fn create_document(
    twilio: &TwilioClient,
    creds: &Credentials,
    friendly_name: String,
    kind: &str,
    attributes: Value,
) -> Result<SupportingDocument, AppError> {
    twilio
        .post_form(
            creds,
            format!("{REGULATORY_BASE}/SupportingDocuments"),
            vec![
                ("FriendlyName", friendly_name),
                ("Type", kind.to_string()),
                ("Attributes", attributes.to_string()),
            ],
        )
        .await
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn business_attributes(request: &CreateBundleRequest, country: &str) -> Value {
    json!({
        "business_name": request.business_name.trim(),
        "business_registration_number": opt(&request.business_registration_number),
        "business_identity": opt(&request.business_registration_number),
        "business_type": request.business_type.as_deref().unwrap_or(DEFAULT_BUSINESS_TYPE),
        "business_industry": request.business_industry.as_deref().unwrap_or(DEFAULT_BUSINESS_INDUSTRY),
        "street_address": opt(&request.business_address),
        "city": opt(&request.business_city),
        "state": opt(&request.business_state),
        "postal_code": opt(&request.business_postal_code),
        "country": country,
        "website": opt(&request.business_website),
        "email": opt(&request.authorized_contact_email),
        "phone_number": opt(&request.authorized_contact_phone),
    })
}

fn contact_attributes(request: &CreateBundleRequest) -> Value {
    json!({
        "first_name": opt(&request.authorized_contact_first_name),
        "last_name": opt(&request.authorized_contact_last_name),
        "email": opt(&request.authorized_contact_email),
        "phone_number": opt(&request.authorized_contact_phone),
        "date_of_birth": request
            .authorized_contact_date_of_birth
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        "job_title": request.authorized_contact_job_title.as_deref().unwrap_or(DEFAULT_JOB_TITLE),
    })
}

fn address_attributes(request: &CreateBundleRequest, country: &str) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    map.insert("address_line_1".into(), opt(&request.business_address).into());
    map.insert("locality".into(), opt(&request.business_city).into());
    map.insert("administrative_area".into(), opt(&request.business_state).into());
    map.insert("postal_code".into(), opt(&request.business_postal_code).into());
    map.insert("country_code".into(), country.into());
    map
}

fn gb_documents(request: &CreateBundleRequest, country: &str) -> Vec<(String, &'static str, Value)> {
    let business = request.business_name.trim();

    let mut registration = serde_json::Map::new();
    registration.insert("business_name".into(), business.into());
    registration.insert(
        "business_registration_number".into(),
        opt(&request.business_registration_number).into(),
    );
    registration.insert(
        "business_type".into(),
        request.business_type.as_deref().unwrap_or(DEFAULT_BUSINESS_TYPE).into(),
    );
    registration.insert(
        "business_industry".into(),
        request
            .business_industry
            .as_deref()
            .unwrap_or(DEFAULT_BUSINESS_INDUSTRY)
            .into(),
    );
    registration.extend(address_attributes(request, country));

    vec![
        (
            format!("{business} - Business Registration"),
            "business_registration",
            Value::Object(registration),
        ),
        (
            format!("{business} - Proof of Address"),
            "proof_of_address",
            Value::Object(address_attributes(request, country)),
        ),
        (
            format!(
                "{} {} - Identity",
                opt(&request.authorized_contact_first_name),
                opt(&request.authorized_contact_last_name)
            ),
            "identity",
            contact_attributes(request),
        ),
    ]
}

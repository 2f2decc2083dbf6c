//! Content template management through the Twilio Content API.
//!
//! Every operation runs under the credentials it is given: subaccount
//! credentials when the caller scopes the request to a subaccount, main
//! account credentials otherwise.

use crate::{
    error::AppError,
    models::template::{
        ApprovalSubmission, ContentPage, ContentTemplate, CreateTemplateRequest, TemplateCategory,
    },
    services::{
        credentials::Credentials,
        twilio_client::{CONTENT_BASE, TwilioClient},
    },
};

pub async fn create(
    twilio: &TwilioClient,
    creds: &Credentials,
    request: &CreateTemplateRequest,
) -> Result<ContentTemplate, AppError> {
    if request.friendly_name.trim().is_empty() {
        return Err(AppError::validation("Template friendly name is required"));
    }
    if request.language.trim().is_empty() {
        return Err(AppError::validation("Template language is required"));
    }

    let body = serde_json::to_value(request)?;
    let template: ContentTemplate = twilio
        .post_json(creds, format!("{CONTENT_BASE}/Content"), body)
        .await?;

    tracing::info!(
        template_sid = %template.sid,
        account_sid = creds.account_sid(),
        "Content template created"
    );
    Ok(template)
}

pub async fn get(
    twilio: &TwilioClient,
    creds: &Credentials,
    sid: &str,
) -> Result<ContentTemplate, AppError> {
    let sid = require_sid(sid)?;
    twilio
        .get(creds, format!("{CONTENT_BASE}/Content/{sid}"))
        .await
}

pub async fn list(
    twilio: &TwilioClient,
    creds: &Credentials,
) -> Result<Vec<ContentTemplate>, AppError> {
    let page: ContentPage = twilio
        .get(creds, format!("{CONTENT_BASE}/Content"))
        .await?;
    tracing::info!(
        account_sid = creds.account_sid(),
        count = page.contents.len(),
        "Listed content templates"
    );
    Ok(page.contents)
}

pub async fn delete(twilio: &TwilioClient, creds: &Credentials, sid: &str) -> Result<(), AppError> {
    let sid = require_sid(sid)?;
    twilio
        .delete(creds, format!("{CONTENT_BASE}/Content/{sid}"))
        .await?;
    tracing::info!(template_sid = %sid, "Content template deleted");
    Ok(())
}

/// Submit a template for WhatsApp approval.
///
/// # Process
///
/// 1. Parse the category (`UTILITY`, `MARKETING` or `AUTHENTICATION`)
/// 2. Fetch the template; a missing template surfaces as Twilio's 404
/// 3. Post the approval request with the normalised name
pub async fn submit_for_approval(
    twilio: &TwilioClient,
    creds: &Credentials,
    sid: &str,
    name: &str,
    category: &str,
) -> Result<ApprovalSubmission, AppError> {
    let sid = require_sid(sid)?;
    let category: TemplateCategory = category.parse()?;

    let template = get(twilio, creds, sid).await?;
    let name = approval_name(name, &template.sid);

    tracing::info!(
        template_sid = %template.sid,
        name = %name,
        category = %category,
        "Submitting content template for WhatsApp approval"
    );

    let submission: ApprovalSubmission = twilio
        .post_json(
            creds,
            format!("{CONTENT_BASE}/Content/{}/ApprovalRequests/whatsapp", template.sid),
            serde_json::json!({ "name": name, "category": category.as_str() }),
        )
        .await?;

    Ok(submission)
}

/// Lowercase alphanumerics and underscores. Falls back to the lowercased SID.
pub fn approval_name(name: &str, template_sid: &str) -> String {
    let normalised: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if normalised.trim_matches('_').is_empty() {
        template_sid.to_lowercase()
    } else {
        normalised
    }
}

fn require_sid(sid: &str) -> Result<&str, AppError> {
    let sid = sid.trim();
    if sid.is_empty() {
        return Err(AppError::validation("Template SID is required"));
    }
    Ok(sid)
}

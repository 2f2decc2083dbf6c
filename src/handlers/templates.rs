//! Content template endpoints.
//!
//! - GET /api/v1/templates - List templates
//! - POST /api/v1/templates - Create a template
//! - GET /api/v1/templates/{sid} - Fetch one template
//! - DELETE /api/v1/templates/{sid} - Delete a template
//! - POST /api/v1/templates/{sid}/approval - Submit for WhatsApp approval
//!
//! Requests run under the main account unless the `X-Subaccount-Sid` header
//! names a subaccount. `X-Subaccount-Auth-Token` optionally supplies that
//! subaccount's own token.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::{HeaderMap, request::Parts},
};

use crate::{
    error::AppError,
    handlers::{ApiResult, ok},
    models::template::{ApprovalRequest, ApprovalSubmission, ContentTemplate, CreateTemplateRequest, DeletedTemplate},
    services::{credentials::Credentials, template_service},
    state::AppState,
};

pub const SUBACCOUNT_SID_HEADER: &str = "x-subaccount-sid";
pub const SUBACCOUNT_TOKEN_HEADER: &str = "x-subaccount-auth-token";

/// Optional subaccount scope read from request headers.
#[derive(Debug, Clone, Default)]
pub struct SubaccountScope {
    pub subaccount_sid: Option<String>,
    pub subaccount_auth_token: Option<String>,
}

impl SubaccountScope {
    fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            subaccount_sid: read(SUBACCOUNT_SID_HEADER),
            subaccount_auth_token: read(SUBACCOUNT_TOKEN_HEADER),
        }
    }

    fn credentials(&self, state: &AppState) -> Result<Credentials, AppError> {
        state.twilio.scoped_credentials(
            self.subaccount_sid.as_deref(),
            self.subaccount_auth_token.as_deref(),
        )
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SubaccountScope {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

pub async fn list(
    State(state): State<AppState>,
    scope: SubaccountScope,
) -> ApiResult<Vec<ContentTemplate>> {
    let creds = scope.credentials(&state)?;
    Ok(ok(template_service::list(&state.twilio, &creds).await?))
}

/// Create a template.
///
/// # Request Body
///
/// ```json
/// {
///   "friendly_name": "order_update",
///   "language": "en",
///   "variables": { "1": "customer" },
///   "types": { "twilio/text": { "body": "Hi {{1}}, your order shipped." } }
/// }
/// ```
pub async fn create(
    State(state): State<AppState>,
    scope: SubaccountScope,
    Json(request): Json<CreateTemplateRequest>,
) -> ApiResult<ContentTemplate> {
    let creds = scope.credentials(&state)?;
    Ok(ok(template_service::create(&state.twilio, &creds, &request).await?))
}

pub async fn get(
    State(state): State<AppState>,
    scope: SubaccountScope,
    Path(sid): Path<String>,
) -> ApiResult<ContentTemplate> {
    let creds = scope.credentials(&state)?;
    Ok(ok(template_service::get(&state.twilio, &creds, &sid).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    scope: SubaccountScope,
    Path(sid): Path<String>,
) -> ApiResult<DeletedTemplate> {
    let creds = scope.credentials(&state)?;
    template_service::delete(&state.twilio, &creds, &sid).await?;
    Ok(ok(DeletedTemplate { sid, deleted: true }))
}

/// Submit a template for WhatsApp approval.
///
/// `category` is one of `UTILITY`, `MARKETING` or `AUTHENTICATION`. An empty
/// `name` falls back to the template SID.
pub async fn submit_for_approval(
    State(state): State<AppState>,
    scope: SubaccountScope,
    Path(sid): Path<String>,
    Json(request): Json<ApprovalRequest>,
) -> ApiResult<ApprovalSubmission> {
    let creds = scope.credentials(&state)?;
    let submission = template_service::submit_for_approval(
        &state.twilio,
        &creds,
        &sid,
        &request.name,
        &request.category,
    )
    .await?;
    Ok(ok(submission))
}

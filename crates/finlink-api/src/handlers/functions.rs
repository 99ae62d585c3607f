//! The three function endpoints.
//!
//! These mirror serverless handlers: CORS-open, POST JSON in, a small
//! `{"success": true, ...}` or `{"error": ...}` JSON out. They are
//! service-role operations and carry no session.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use validator::Validate;

use finlink_models::{EmailKind, NotificationPayload, ProfileId};

use crate::error::{ApiError, ApiResult};
use crate::services::EmailRequest;
use crate::state::AppState;

const ADMIN_ROLE: &str = "admin";

#[derive(Deserialize, Validate)]
pub struct CreateAdminUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct CreateAdminUserResponse {
    pub success: bool,
    pub user_id: String,
}

/// Create (or find) the auth user for an admin and grant the admin role.
/// Both steps are idempotent, so replays converge on the same state.
pub async fn create_admin_user(
    State(state): State<AppState>,
    Json(request): Json<CreateAdminUserRequest>,
) -> ApiResult<Json<CreateAdminUserResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = state
        .auth_admin
        .create_or_find_user(&request.email, &request.password)
        .await?;
    state.roles.grant(&user.id, ADMIN_ROLE).await?;

    info!(user_id = %user.id, "Provisioned admin user");
    Ok(Json(CreateAdminUserResponse {
        success: true,
        user_id: user.id,
    }))
}

/// Dispatch event body: a lowercase tag, an optional recipient, an
/// optional email address, and the per-tag payload fields nested under
/// `data`.
#[derive(Deserialize)]
pub struct DispatchRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "recipientProfileId", default)]
    pub recipient_profile_id: Option<String>,
    #[serde(rename = "recipientEmail", default)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub delivered: usize,
}

/// Dispatch one platform event: webhook + in-app rows + feed publish,
/// plus the matching transactional email when the caller supplies a
/// `recipientEmail` and the event has a template.
pub async fn dispatch_notification(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> ApiResult<Json<DispatchResponse>> {
    // Fold the tag into the data object so the payload union can parse it.
    let mut value = match request.data {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        _ => return Err(ApiError::BadRequest("data must be an object".to_string())),
    };
    let extras = value.clone();
    value.insert("type".to_string(), Value::String(request.kind.clone()));
    let payload: NotificationPayload = serde_json::from_value(Value::Object(value))
        .map_err(|e| ApiError::BadRequest(format!("Unknown or malformed event: {e}")))?;

    let recipient = request.recipient_profile_id.map(ProfileId::from_string);
    let rows = state.dispatcher.dispatch(recipient, payload.clone()).await?;

    let recipient_email = request
        .recipient_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    if let Some(to) = recipient_email {
        if let Some(kind) = EmailKind::for_event(&payload) {
            let field = |name: &str| {
                extras
                    .get(name)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            let recipient_name = field("recipientName")
                .or_else(|| field("displayName"))
                .unwrap_or_else(|| "there".to_string());
            let sender_name = field("senderName").or_else(|| field("accepterName"));
            let email = EmailRequest {
                kind,
                recipient_email: to.to_string(),
                recipient_name,
                sender_name,
                metadata: Some(Value::Object(extras)),
            };
            // Same contract as the webhook leg: the in-app rows already
            // landed, so a failed email is logged rather than surfaced.
            if let Err(err) = state.email.send(&email).await {
                warn!(kind = request.kind.as_str(), error = %err, "Dispatch email failed");
            }
        }
    }

    Ok(Json(DispatchResponse {
        success: true,
        delivered: rows.len(),
    }))
}

#[derive(Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub status: String,
}

/// Render and send one transactional email.
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> ApiResult<Json<SendEmailResponse>> {
    let status = state.email.send(&request).await?;
    Ok(Json(SendEmailResponse {
        success: true,
        status: status.as_str().to_string(),
    }))
}

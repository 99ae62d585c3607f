//! Transactional email sender.
//!
//! Renders one of the fixed HTML templates and hands it to the provider's
//! JSON API. Without an API key the sender runs in log-only mode: the
//! rendered email is traced and recorded as `logged` instead of sent.
//! Every outcome lands in `notification_logs`.

use std::time::Duration;

use finlink_models::{DeliveryStatus, EmailKind};
use finlink_supabase::NotificationLogRepo;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// A send request, as accepted by the email function endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    #[serde(rename = "type")]
    pub kind: EmailKind,
    #[serde(rename = "recipientEmail")]
    pub recipient_email: String,
    #[serde(rename = "recipientName")]
    pub recipient_name: String,
    #[serde(rename = "senderName", default)]
    pub sender_name: Option<String>,
    /// Template extras, e.g. the formatted amount on a payment receipt.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct EmailSender {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    from: String,
    logs: NotificationLogRepo,
}

impl EmailSender {
    pub fn new(config: &ApiConfig, logs: NotificationLogRepo) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: config.email_api_key.clone(),
            api_url: config.email_api_url.clone(),
            from: config.email_from.clone(),
            logs,
        }
    }

    /// Render and send one email, returning the delivery outcome.
    pub async fn send(&self, request: &EmailRequest) -> ApiResult<DeliveryStatus> {
        if request.recipient_email.trim().is_empty() {
            return Err(ApiError::Validation("recipientEmail is required".to_string()));
        }

        let subject = request.kind.subject();
        let html = render_template(request);

        let status = match &self.api_key {
            None => {
                info!(
                    kind = request.kind.as_str(),
                    to = %request.recipient_email,
                    subject,
                    "No email API key configured; logging instead of sending"
                );
                DeliveryStatus::Logged
            }
            Some(key) => {
                let body = json!({
                    "from": self.from,
                    "to": [request.recipient_email],
                    "subject": subject,
                    "html": html,
                });
                let outcome = self
                    .http
                    .post(&self.api_url)
                    .bearer_auth(key)
                    .json(&body)
                    .send()
                    .await;
                match outcome {
                    Ok(resp) if resp.status().is_success() => {
                        info!(kind = request.kind.as_str(), to = %request.recipient_email, "Sent email");
                        DeliveryStatus::Sent
                    }
                    Ok(resp) => {
                        warn!(kind = request.kind.as_str(), status = %resp.status(), "Email provider returned an error");
                        DeliveryStatus::Failed
                    }
                    Err(err) => {
                        warn!(kind = request.kind.as_str(), error = %err, "Email send failed");
                        DeliveryStatus::Failed
                    }
                }
            }
        };
        metrics::record_email(request.kind.as_str(), status.as_str());

        if let Err(err) = self
            .logs
            .record(request.kind.as_str(), &request.recipient_email, status, None)
            .await
        {
            warn!(error = %err, "Failed to record email outcome");
        }

        Ok(status)
    }
}

/// Render the HTML body for a request.
fn render_template(request: &EmailRequest) -> String {
    let name = &request.recipient_name;
    let sender = request.sender_name.as_deref().unwrap_or("Someone");
    match request.kind {
        EmailKind::Welcome => format!(
            "<h1>Welcome to Finlink, {name}!</h1>\
             <p>Your account is ready. Complete your profile to start connecting.</p>"
        ),
        EmailKind::ConnectionRequest => format!(
            "<h1>Hi {name},</h1>\
             <p>{sender} sent you a connection request. Log in to respond.</p>"
        ),
        EmailKind::ConnectionAccepted => format!(
            "<h1>Hi {name},</h1>\
             <p>{sender} accepted your connection request. You can now message each other.</p>"
        ),
        EmailKind::PaymentReceipt => {
            let amount = request
                .metadata
                .as_ref()
                .and_then(|m| m.get("amountFormatted"))
                .and_then(|v| v.as_str())
                .unwrap_or("your payment");
            format!(
                "<h1>Hi {name},</h1>\
                 <p>We received {amount}. Thank you for using Finlink.</p>"
            )
        }
        EmailKind::VerificationComplete => format!(
            "<h1>Hi {name},</h1>\
             <p>Your verification checks are complete. See your profile for the result.</p>"
        ),
    }
}

//! Notification dispatch pipeline.
//!
//! One entry point fans a typed event out to three sinks:
//! - an outbound webhook for automation, keyed by event type
//! - an in-app notification row per recipient
//! - the change feed, so live sessions see the row immediately
//!
//! The in-app insert is the primary write; webhook and feed failures are
//! logged and swallowed. `user_onboarded` has no explicit recipient and
//! fans out to every admin profile instead.

use std::sync::Arc;
use std::time::Duration;

use finlink_models::{DeliveryStatus, Notification, NotificationPayload, ProfileId};
use finlink_realtime::ChangeFeed;
use finlink_supabase::{NotificationLogRepo, NotificationRepo, ProfileRepo};
use tracing::{info, warn};

use crate::config::WebhookUrls;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Routes typed events to webhooks, notification rows, and the change feed.
#[derive(Clone)]
pub struct NotificationDispatcher {
    profiles: ProfileRepo,
    notifications: NotificationRepo,
    logs: NotificationLogRepo,
    feed: Arc<ChangeFeed>,
    webhooks: WebhookUrls,
    http: reqwest::Client,
}

impl NotificationDispatcher {
    pub fn new(
        profiles: ProfileRepo,
        notifications: NotificationRepo,
        logs: NotificationLogRepo,
        feed: Arc<ChangeFeed>,
        webhooks: WebhookUrls,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            profiles,
            notifications,
            logs,
            feed,
            webhooks,
            http,
        }
    }

    /// Dispatch one event.
    ///
    /// `recipient` is required for every event type except
    /// [`NotificationPayload::UserOnboarded`], which fans out to all admins.
    /// Returns the notification rows that were persisted.
    pub async fn dispatch(
        &self,
        recipient: Option<ProfileId>,
        payload: NotificationPayload,
    ) -> ApiResult<Vec<Notification>> {
        let tag = payload.tag();

        self.call_webhook(&payload, recipient.as_ref()).await;

        let recipients = match &payload {
            NotificationPayload::UserOnboarded { .. } => {
                let admins = self.profiles.admin_profiles().await?;
                admins.into_iter().map(|p| p.id).collect()
            }
            _ => match recipient {
                Some(id) => vec![id],
                None => {
                    return Err(ApiError::BadRequest(format!(
                        "recipientProfileId is required for {tag}"
                    )))
                }
            },
        };

        let mut persisted = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let row = Notification::for_recipient(recipient.clone(), payload.clone());
            let inserted = self.notifications.insert(&row).await?;
            metrics::record_notification_dispatched(tag);

            if let Err(err) = self.feed.publish_notification(&inserted).await {
                warn!(recipient = %recipient, error = %err, "Failed to publish notification to feed");
            }
            persisted.push(inserted);
        }

        info!(event = tag, count = persisted.len(), "Dispatched notification");
        Ok(persisted)
    }

    /// The configured webhook for an event type, if any.
    fn webhook_for(&self, payload: &NotificationPayload) -> Option<(&'static str, &str)> {
        let (name, url) = match payload {
            NotificationPayload::UserOnboarded { .. } => {
                ("user_onboarded", self.webhooks.user_onboarded.as_ref())
            }
            NotificationPayload::ConnectionRequestSent { .. }
            | NotificationPayload::ConnectionAccepted { .. }
            | NotificationPayload::ConnectionDeclined { .. } => {
                ("connection", self.webhooks.connection.as_ref())
            }
            NotificationPayload::PaymentCompleted { .. } => {
                ("payment", self.webhooks.payment.as_ref())
            }
            NotificationPayload::NewReview { .. } => ("review", self.webhooks.review.as_ref()),
            _ => return None,
        };
        url.map(|u| (name, u.as_str()))
    }

    /// POST the event to its webhook. Failures are recorded and swallowed.
    async fn call_webhook(&self, payload: &NotificationPayload, recipient: Option<&ProfileId>) {
        let Some((hook, url)) = self.webhook_for(payload) else {
            return;
        };

        let mut body = match serde_json::to_value(payload) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return,
        };
        if let Some(recipient) = recipient {
            body.insert(
                "recipientProfileId".to_string(),
                serde_json::Value::String(recipient.to_string()),
            );
        }

        let outcome = self.http.post(url).json(&body).send().await;
        let (ok, status, detail) = match outcome {
            Ok(resp) if resp.status().is_success() => (true, DeliveryStatus::Sent, None),
            Ok(resp) => {
                let status = resp.status();
                warn!(hook, status = %status, "Webhook returned an error status");
                (false, DeliveryStatus::Failed, Some(format!("status {status}")))
            }
            Err(err) => {
                warn!(hook, error = %err, "Webhook call failed");
                (false, DeliveryStatus::Failed, Some(err.to_string()))
            }
        };
        metrics::record_webhook_call(hook, ok);

        let recipient = recipient.map(ProfileId::to_string).unwrap_or_default();
        if let Err(err) = self
            .logs
            .record(payload.tag(), &recipient, status, detail.as_deref())
            .await
        {
            warn!(hook, error = %err, "Failed to record webhook outcome");
        }
    }
}

//! Insert events via Redis Pub/Sub.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use finlink_models::{ChangeEvent, ConnectionRequestId, Message, Notification, ProfileId};

use crate::error::RealtimeResult;

/// Buffered events per subscriber before backpressure kicks in.
const SUBSCRIPTION_BUFFER: usize = 64;

/// Channel for publishing/subscribing to row-insert events.
pub struct ChangeFeed {
    client: redis::Client,
}

impl ChangeFeed {
    /// Create a new change feed.
    pub fn new(redis_url: &str) -> RealtimeResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> RealtimeResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    /// Cheap reachability probe (PING).
    pub async fn health_check(&self) -> RealtimeResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    /// Channel name for a recipient's notifications.
    pub fn notifications_channel(recipient: &ProfileId) -> String {
        format!("notifications:{}", recipient)
    }

    /// Channel name for a thread's messages.
    pub fn messages_channel(thread_id: &ConnectionRequestId) -> String {
        format!("messages:{}", thread_id)
    }

    async fn publish(&self, channel: String, event: &ChangeEvent) -> RealtimeResult<()> {
        use redis::AsyncCommands;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(event)?;

        debug!("Publishing insert event to {}", channel);
        conn.publish::<_, _, ()>(channel, payload).await?;

        Ok(())
    }

    /// Publish a notification insert to its recipient's channel.
    pub async fn publish_notification(&self, row: &Notification) -> RealtimeResult<()> {
        let channel = Self::notifications_channel(&row.recipient_profile_id);
        self.publish(channel, &ChangeEvent::NotificationInserted { row: row.clone() })
            .await
    }

    /// Publish a message insert to its thread's channel.
    pub async fn publish_message(&self, row: &Message) -> RealtimeResult<()> {
        let channel = Self::messages_channel(&row.connection_request_id);
        self.publish(channel, &ChangeEvent::MessageInserted { row: row.clone() })
            .await
    }

    /// Subscribe to notification inserts for a recipient.
    pub async fn subscribe_notifications(
        &self,
        recipient: &ProfileId,
    ) -> RealtimeResult<Subscription> {
        self.subscribe(Self::notifications_channel(recipient)).await
    }

    /// Subscribe to message inserts on a thread.
    pub async fn subscribe_messages(
        &self,
        thread_id: &ConnectionRequestId,
    ) -> RealtimeResult<Subscription> {
        self.subscribe(Self::messages_channel(thread_id)).await
    }

    async fn subscribe(&self, channel: String) -> RealtimeResult<Subscription> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&channel).await?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let pump = tokio::spawn(async move {
            let mut stream = pubsub.into_on_message();
            while let Some(msg) = stream.next().await {
                let Ok(payload) = msg.get_payload::<String>() else {
                    continue;
                };
                let Ok(event) = serde_json::from_str::<ChangeEvent>(&payload) else {
                    debug!("Dropping malformed feed payload");
                    continue;
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription { rx, pump })
    }
}

/// A live subscription to one feed channel.
///
/// Dropping the subscription aborts the pump task, which tears down the
/// pub/sub connection and with it the server-side subscription. Scope
/// exit is the unsubscribe.
pub struct Subscription {
    rx: mpsc::Receiver<ChangeEvent>,
    pump: JoinHandle<()>,
}

impl Subscription {
    /// Next event, or `None` once the feed connection is gone.
    /// Cancel-safe, so it can sit in a `select!` arm.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

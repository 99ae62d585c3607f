//! Per-session message thread.
//!
//! A thread is keyed by its connection request; only the two parties may
//! open it. Opening loads the history oldest first and marks the other
//! party's unread rows read. Sends are trimmed, persisted, published to
//! the change feed, and a new-message notification is dispatched to the
//! other party on a best-effort basis.

use std::sync::Arc;

use finlink_models::{ConnectionRequest, Message, NotificationPayload, Profile};
use finlink_realtime::ChangeFeed;
use finlink_supabase::MessageRepo;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::NotificationDispatcher;

/// Session-scoped view over one conversation.
pub struct MessageThread {
    repo: MessageRepo,
    feed: Arc<ChangeFeed>,
    dispatcher: NotificationDispatcher,
    thread: ConnectionRequest,
    viewer: Profile,
    /// Oldest first.
    items: Vec<Message>,
}

impl MessageThread {
    /// Open the thread for `viewer`, verifying they are a party to it.
    ///
    /// Loading marks every unread row not authored by the viewer as read,
    /// both remotely and in the returned history.
    pub async fn open(
        repo: MessageRepo,
        feed: Arc<ChangeFeed>,
        dispatcher: NotificationDispatcher,
        thread: ConnectionRequest,
        viewer: Profile,
    ) -> ApiResult<Self> {
        if !thread.includes(&viewer.id) {
            return Err(ApiError::forbidden("Not a party to this conversation"));
        }

        let mut items = repo.list_for_thread(&thread.id).await?;
        let unread_from_other = items
            .iter()
            .any(|m| m.sender_profile_id != viewer.id && !m.is_read);
        if unread_from_other {
            repo.mark_thread_read(&thread.id, &viewer.id).await?;
            for item in &mut items {
                if item.sender_profile_id != viewer.id {
                    item.is_read = true;
                }
            }
        }
        debug!(thread_id = %thread.id, count = items.len(), "Opened message thread");

        Ok(Self {
            repo,
            feed,
            dispatcher,
            thread,
            viewer,
            items,
        })
    }

    pub fn items(&self) -> &[Message] {
        &self.items
    }

    pub fn thread_id(&self) -> &finlink_models::ConnectionRequestId {
        &self.thread.id
    }

    /// Apply an inserted row from the change feed.
    ///
    /// Idempotent on redelivery; rows for other threads and rows already
    /// present are dropped. Returns whether the row was actually added.
    pub fn apply_insert(&mut self, row: Message) -> bool {
        if row.connection_request_id != self.thread.id {
            return false;
        }
        if self.items.iter().any(|m| m.id == row.id) {
            return false;
        }
        self.items.push(row);
        true
    }

    /// Mark a freshly-arrived row from the other party read.
    ///
    /// Called by the live delivery path after [`apply_insert`] accepts a
    /// row; the dedupe there guarantees the remote update runs once per
    /// message even when the feed redelivers.
    pub async fn mark_incoming_read(&mut self, message_id: &finlink_models::MessageId) -> ApiResult<()> {
        let Some(pos) = self.items.iter().position(|m| m.id == *message_id) else {
            return Ok(());
        };
        if self.items[pos].sender_profile_id == self.viewer.id || self.items[pos].is_read {
            return Ok(());
        }
        self.repo.mark_read(message_id).await?;
        self.items[pos].is_read = true;
        Ok(())
    }

    /// Send a message.
    ///
    /// Whitespace-only content is a no-op returning `None`. On success the
    /// persisted row is appended locally, published to the change feed, and
    /// a notification is dispatched to the other party; feed and dispatch
    /// failures are logged, never surfaced.
    pub async fn send(&mut self, content: &str) -> ApiResult<Option<Message>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let row = Message::new(
            self.thread.id.clone(),
            self.viewer.id.clone(),
            content.to_string(),
        );
        let inserted = self.repo.insert(&row).await?;

        if let Err(err) = self.feed.publish_message(&inserted).await {
            warn!(thread_id = %self.thread.id, error = %err, "Failed to publish message to feed");
        }

        if let Some(other) = self.thread.other_party(&self.viewer.id) {
            let payload = NotificationPayload::NewMessage {
                connection_request_id: self.thread.id.clone(),
                sender_name: self.viewer.display_name.clone(),
            };
            if let Err(err) = self
                .dispatcher
                .dispatch(Some(other.clone()), payload)
                .await
            {
                warn!(thread_id = %self.thread.id, error = %err, "Failed to dispatch new-message notification");
            }
        }

        self.items.push(inserted.clone());
        Ok(Some(inserted))
    }
}

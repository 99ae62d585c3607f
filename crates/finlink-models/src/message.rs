//! Thread messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConnectionRequestId, MessageId, ProfileId};

/// A message row. Belongs to exactly one connection-request thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    pub connection_request_id: ConnectionRequestId,

    pub sender_profile_id: ProfileId,

    pub content: String,

    #[serde(default)]
    pub is_read: bool,

    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new unread message for a thread.
    pub fn new(
        connection_request_id: ConnectionRequestId,
        sender_profile_id: ProfileId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            connection_request_id,
            sender_profile_id,
            content: content.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

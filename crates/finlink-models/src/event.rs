//! Realtime change-feed events.
//!
//! The feed only ever carries row inserts; `is_read` flips are applied
//! locally by whichever store observes them.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::notification::Notification;

/// An insert event published to the change feed and forwarded over the
/// websocket wire. Delivery order and uniqueness are whatever the feed
/// provides; consumers dedupe by row id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A notification row was inserted.
    #[serde(rename = "notifications")]
    NotificationInserted { row: Notification },

    /// A message row was inserted.
    #[serde(rename = "messages")]
    MessageInserted { row: Message },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ConnectionRequestId, ProfileId};

    #[test]
    fn test_message_event_tag() {
        let event = ChangeEvent::MessageInserted {
            row: Message::new(
                ConnectionRequestId::from_string("c1"),
                ProfileId::from_string("p1"),
                "hi",
            ),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["table"], "messages");
        assert_eq!(json["row"]["content"], "hi");
    }
}

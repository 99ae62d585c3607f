//! In-app notifications.
//!
//! The payload is a tagged union with one explicit shape per event type.
//! The database column stores the serialized payload; the `type` tag is
//! what the dispatcher routes on, so there is no loose metadata bag to
//! guess keys out of at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConnectionRequestId, NotificationId, ProfileId};
use crate::profile::UserType;

/// Typed notification payload, one variant per platform event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// A new user finished onboarding (delivered to admins).
    UserOnboarded {
        user_type: UserType,
        display_name: String,
    },

    /// Someone sent a connection request.
    ConnectionRequestSent {
        #[serde(rename = "connectionRequestId")]
        connection_request_id: ConnectionRequestId,
        #[serde(rename = "senderName")]
        sender_name: String,
    },

    /// A connection request was accepted.
    ConnectionAccepted {
        #[serde(rename = "connectionRequestId")]
        connection_request_id: ConnectionRequestId,
        #[serde(rename = "accepterName")]
        accepter_name: String,
    },

    /// A connection request was declined.
    ConnectionDeclined {
        #[serde(rename = "connectionRequestId")]
        connection_request_id: ConnectionRequestId,
    },

    /// A payment went through for an engagement.
    PaymentCompleted {
        #[serde(rename = "connectionRequestId")]
        connection_request_id: ConnectionRequestId,
        #[serde(rename = "amountCents")]
        amount_cents: i64,
    },

    /// A new message arrived in a thread.
    NewMessage {
        #[serde(rename = "connectionRequestId")]
        connection_request_id: ConnectionRequestId,
        #[serde(rename = "senderName")]
        sender_name: String,
    },

    /// A review was left on a profile.
    NewReview {
        #[serde(rename = "reviewerName")]
        reviewer_name: String,
        rating: u8,
    },

    /// All verification checks finished.
    VerificationCompleted {
        #[serde(rename = "scorePercent")]
        score_percent: u8,
    },

    /// A professional reference was added.
    ReferenceAdded {
        #[serde(rename = "referenceName")]
        reference_name: String,
    },
}

impl NotificationPayload {
    /// The event tag as it appears on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationPayload::UserOnboarded { .. } => "user_onboarded",
            NotificationPayload::ConnectionRequestSent { .. } => "connection_request_sent",
            NotificationPayload::ConnectionAccepted { .. } => "connection_accepted",
            NotificationPayload::ConnectionDeclined { .. } => "connection_declined",
            NotificationPayload::PaymentCompleted { .. } => "payment_completed",
            NotificationPayload::NewMessage { .. } => "new_message",
            NotificationPayload::NewReview { .. } => "new_review",
            NotificationPayload::VerificationCompleted { .. } => "verification_completed",
            NotificationPayload::ReferenceAdded { .. } => "reference_added",
        }
    }

    /// Display title for the in-app row.
    pub fn title(&self) -> &'static str {
        match self {
            NotificationPayload::UserOnboarded { .. } => "New User Onboarded",
            NotificationPayload::ConnectionRequestSent { .. } => "New Connection Request",
            NotificationPayload::ConnectionAccepted { .. } => "Connection Accepted",
            NotificationPayload::ConnectionDeclined { .. } => "Connection Declined",
            NotificationPayload::PaymentCompleted { .. } => "Payment Completed",
            NotificationPayload::NewMessage { .. } => "New Message",
            NotificationPayload::NewReview { .. } => "New Review",
            NotificationPayload::VerificationCompleted { .. } => "Verification Completed",
            NotificationPayload::ReferenceAdded { .. } => "Reference Added",
        }
    }

    /// One-line body text for the in-app row.
    pub fn body(&self) -> String {
        match self {
            NotificationPayload::UserOnboarded { user_type, display_name } => {
                format!("{} joined as a {}", display_name, user_type.as_str())
            }
            NotificationPayload::ConnectionRequestSent { sender_name, .. } => {
                format!("{} wants to connect with you", sender_name)
            }
            NotificationPayload::ConnectionAccepted { accepter_name, .. } => {
                format!("{} accepted your connection request", accepter_name)
            }
            NotificationPayload::ConnectionDeclined { .. } => {
                "Your connection request was declined".to_string()
            }
            NotificationPayload::PaymentCompleted { amount_cents, .. } => {
                format!("A payment of ${}.{:02} was completed", amount_cents / 100, amount_cents % 100)
            }
            NotificationPayload::NewMessage { sender_name, .. } => {
                format!("{} sent you a message", sender_name)
            }
            NotificationPayload::NewReview { reviewer_name, rating } => {
                format!("{} left you a {}-star review", reviewer_name, rating)
            }
            NotificationPayload::VerificationCompleted { score_percent } => {
                format!("Your verification is complete at {}%", score_percent)
            }
            NotificationPayload::ReferenceAdded { reference_name } => {
                format!("{} was added as a reference", reference_name)
            }
        }
    }
}

/// A notification row. Append-only; only `is_read` ever mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,

    pub recipient_profile_id: ProfileId,

    pub title: String,

    /// Rendered body text.
    pub message: String,

    /// Typed payload (flattened so the `type` tag lands on the row).
    #[serde(flatten)]
    pub payload: NotificationPayload,

    #[serde(default)]
    pub is_read: bool,

    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build a row for a recipient from a typed payload.
    pub fn for_recipient(recipient: ProfileId, payload: NotificationPayload) -> Self {
        Self {
            id: NotificationId::new(),
            recipient_profile_id: recipient,
            title: payload.title().to_string(),
            message: payload.body(),
            payload,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Delivery outcome recorded in `notification_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Handed to the outbound provider.
    Sent,
    /// Provider call failed.
    Failed,
    /// No provider configured; logged only.
    Logged,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Logged => "logged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_tag_round_trip() {
        let payload = NotificationPayload::NewMessage {
            connection_request_id: ConnectionRequestId::from_string("c1"),
            sender_name: "Alice".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "new_message");
        assert_eq!(json["connectionRequestId"], "c1");
        let back: NotificationPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_new_message_title() {
        let payload = NotificationPayload::NewMessage {
            connection_request_id: ConnectionRequestId::from_string("c1"),
            sender_name: "Alice".to_string(),
        };
        assert_eq!(payload.title(), "New Message");
        assert_eq!(payload.body(), "Alice sent you a message");
    }

    #[test]
    fn test_for_recipient_carries_payload_tag() {
        let n = Notification::for_recipient(
            ProfileId::from_string("p1"),
            NotificationPayload::ConnectionDeclined {
                connection_request_id: ConnectionRequestId::from_string("c9"),
            },
        );
        assert!(!n.is_read);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "connection_declined");
        assert_eq!(json["recipient_profile_id"], "p1");
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = serde_json::from_str::<NotificationPayload>(r#"{"type":"mystery"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_delivery_status_strings() {
        assert_eq!(DeliveryStatus::Sent.as_str(), "sent");
        assert_eq!(DeliveryStatus::Failed.as_str(), "failed");
        assert_eq!(DeliveryStatus::Logged.as_str(), "logged");
    }
}

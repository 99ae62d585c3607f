//! Transactional email template kinds.

use serde::{Deserialize, Serialize};

use crate::notification::NotificationPayload;

/// The five fixed email templates the sender knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Welcome,
    ConnectionRequest,
    ConnectionAccepted,
    PaymentReceipt,
    VerificationComplete,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Welcome => "welcome",
            EmailKind::ConnectionRequest => "connection_request",
            EmailKind::ConnectionAccepted => "connection_accepted",
            EmailKind::PaymentReceipt => "payment_receipt",
            EmailKind::VerificationComplete => "verification_complete",
        }
    }

    /// The template matching a platform event, for events that carry an
    /// email alongside the in-app notification. Events without a template
    /// (declines, new messages, reviews, references) return `None`.
    pub fn for_event(payload: &NotificationPayload) -> Option<Self> {
        match payload {
            NotificationPayload::UserOnboarded { .. } => Some(EmailKind::Welcome),
            NotificationPayload::ConnectionRequestSent { .. } => Some(EmailKind::ConnectionRequest),
            NotificationPayload::ConnectionAccepted { .. } => Some(EmailKind::ConnectionAccepted),
            NotificationPayload::PaymentCompleted { .. } => Some(EmailKind::PaymentReceipt),
            NotificationPayload::VerificationCompleted { .. } => {
                Some(EmailKind::VerificationComplete)
            }
            _ => None,
        }
    }

    /// Subject line for the template.
    pub fn subject(&self) -> &'static str {
        match self {
            EmailKind::Welcome => "Welcome to Finlink",
            EmailKind::ConnectionRequest => "You have a new connection request",
            EmailKind::ConnectionAccepted => "Your connection request was accepted",
            EmailKind::PaymentReceipt => "Your payment receipt",
            EmailKind::VerificationComplete => "Your verification is complete",
        }
    }
}

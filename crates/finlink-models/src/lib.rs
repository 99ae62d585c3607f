//! Shared data models for the Finlink backend.
//!
//! This crate provides Serde-serializable types for:
//! - Profiles and the worker/business split
//! - Connection requests and messaging threads
//! - In-app notifications with typed per-event payloads
//! - Verification checks and scoring
//! - Realtime change-feed events

pub mod connection;
pub mod email;
pub mod event;
pub mod ids;
pub mod message;
pub mod notification;
pub mod profile;
pub mod verification;

// Re-export common types
pub use connection::{ConnectionRequest, ConnectionStatus};
pub use email::EmailKind;
pub use event::ChangeEvent;
pub use ids::{ConnectionRequestId, MessageId, NotificationId, ProfileId};
pub use message::Message;
pub use notification::{DeliveryStatus, Notification, NotificationPayload};
pub use profile::{Profile, UserType};
pub use verification::{
    score_percent, ApprovalStatus, VerificationBadge, VerificationChecks, VerificationStatus,
};

//! Identifier newtypes.
//!
//! All ids are opaque strings on the wire (the database assigns UUIDs);
//! newtypes keep a profile id from being passed where a thread id belongs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Create from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a profile (distinct from the auth account id).
    ProfileId
);

string_id!(
    /// Unique identifier for a connection request (a messaging thread).
    ConnectionRequestId
);

string_id!(
    /// Unique identifier for a message row.
    MessageId
);

string_id!(
    /// Unique identifier for a notification row.
    NotificationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_matches_inner() {
        let id = ProfileId::from_string("p-123");
        assert_eq!(id.to_string(), "p-123");
        assert_eq!(id.as_str(), "p-123");
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(NotificationId::new(), NotificationId::new());
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = MessageId::from_string("m-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"m-1\"");
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

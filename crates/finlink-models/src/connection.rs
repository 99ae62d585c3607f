//! Connection requests: the relationship object gating messaging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConnectionRequestId, ProfileId};

/// Connection request status. Set externally; this code only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Declined => "declined",
        }
    }
}

/// A connection request linking a worker and a business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: ConnectionRequestId,

    pub worker_profile_id: ProfileId,

    pub business_profile_id: ProfileId,

    #[serde(default)]
    pub status: ConnectionStatus,

    pub created_at: DateTime<Utc>,
}

impl ConnectionRequest {
    /// True if the given profile is one of the thread's two parties.
    pub fn includes(&self, profile_id: &ProfileId) -> bool {
        &self.worker_profile_id == profile_id || &self.business_profile_id == profile_id
    }

    /// The other party of the thread, if `profile_id` is a party at all.
    pub fn other_party(&self, profile_id: &ProfileId) -> Option<&ProfileId> {
        if &self.worker_profile_id == profile_id {
            Some(&self.business_profile_id)
        } else if &self.business_profile_id == profile_id {
            Some(&self.worker_profile_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ConnectionRequest {
        ConnectionRequest {
            id: ConnectionRequestId::from_string("c1"),
            worker_profile_id: ProfileId::from_string("w1"),
            business_profile_id: ProfileId::from_string("b1"),
            status: ConnectionStatus::Accepted,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_includes_both_parties_only() {
        let r = request();
        assert!(r.includes(&ProfileId::from_string("w1")));
        assert!(r.includes(&ProfileId::from_string("b1")));
        assert!(!r.includes(&ProfileId::from_string("x")));
    }

    #[test]
    fn test_other_party() {
        let r = request();
        assert_eq!(
            r.other_party(&ProfileId::from_string("w1")),
            Some(&ProfileId::from_string("b1"))
        );
        assert_eq!(r.other_party(&ProfileId::from_string("x")), None);
    }
}

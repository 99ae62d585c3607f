//! Profiles: the application-level identity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ProfileId;

/// Which side of the marketplace a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// A finance professional looking for engagements.
    Worker,
    /// A hiring business.
    Business,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Worker => "worker",
            UserType::Business => "business",
        }
    }
}

/// A profile row. One per authenticated user; `user_id` points at the
/// auth account, `id` is what the rest of the schema references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,

    /// Auth account id (GoTrue user id).
    pub user_id: String,

    pub user_type: UserType,

    pub display_name: String,

    /// Set for business profiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Create a new profile for an auth user.
    pub fn new(user_id: impl Into<String>, user_type: UserType, display_name: impl Into<String>) -> Self {
        Self {
            id: ProfileId::new(),
            user_id: user_id.into(),
            user_type,
            display_name: display_name.into(),
            company_name: None,
            created_at: Utc::now(),
        }
    }
}

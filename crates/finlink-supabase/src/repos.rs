//! Typed repositories over PostgREST tables.
//!
//! Table and column names are fixed by the externally-owned schema; the
//! repos only issue typed queries against them. Notifications are
//! append-only and only ever mutate `is_read`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use finlink_models::{
    ApprovalStatus, ConnectionRequest, ConnectionRequestId, DeliveryStatus, Message, MessageId,
    Notification, NotificationId, Profile, ProfileId, UserType, VerificationChecks,
};

use crate::client::SupabaseClient;
use crate::error::SupabaseResult;

/// Repository for profile rows.
#[derive(Clone)]
pub struct ProfileRepo {
    client: SupabaseClient,
}

impl ProfileRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Get a profile by id.
    pub async fn get(&self, profile_id: &ProfileId) -> SupabaseResult<Option<Profile>> {
        let filter = format!("eq.{}", profile_id);
        let rows: Vec<Profile> = self
            .client
            .select("profiles", &[("id", &filter), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Find the profile belonging to an auth account.
    pub async fn find_by_user(&self, user_id: &str) -> SupabaseResult<Option<Profile>> {
        let filter = format!("eq.{}", user_id);
        let rows: Vec<Profile> = self
            .client
            .select("profiles", &[("user_id", &filter), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Create a new profile row.
    pub async fn create(&self, profile: &Profile) -> SupabaseResult<Profile> {
        let created: Profile = self.client.insert("profiles", profile).await?;
        info!(profile_id = %created.id, "Created profile");
        Ok(created)
    }

    /// Resolve all admin profiles, creating missing ones.
    ///
    /// Admins are auth users carrying the `admin` role; an admin who has
    /// never opened the app has no profile row yet, so one is created on
    /// the fly. Concurrent callers can race here; the insert ignores
    /// duplicates so the second writer gets the first writer's row on the
    /// follow-up read.
    pub async fn admin_profiles(&self) -> SupabaseResult<Vec<Profile>> {
        let role_rows: Vec<UserRoleRow> = self
            .client
            .select("user_roles", &[("role", "eq.admin"), ("select", "user_id")])
            .await?;

        let mut profiles = Vec::with_capacity(role_rows.len());
        for role in role_rows {
            if let Some(profile) = self.find_by_user(&role.user_id).await? {
                profiles.push(profile);
                continue;
            }

            let fresh = Profile::new(&role.user_id, UserType::Business, "Admin");
            match self
                .client
                .insert_ignore_duplicates::<_, Profile>("profiles", &fresh)
                .await?
            {
                Some(created) => {
                    info!(profile_id = %created.id, "Lazily created admin profile");
                    profiles.push(created);
                }
                // Lost the race; someone else inserted it.
                None => {
                    if let Some(existing) = self.find_by_user(&role.user_id).await? {
                        profiles.push(existing);
                    } else {
                        warn!(user_id = %role.user_id, "Admin profile vanished after conflict");
                    }
                }
            }
        }

        Ok(profiles)
    }
}

#[derive(Deserialize)]
struct UserRoleRow {
    user_id: String,
}

/// Repository for message rows.
#[derive(Clone)]
pub struct MessageRepo {
    client: SupabaseClient,
}

impl MessageRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// All messages of a thread, oldest first.
    pub async fn list_for_thread(
        &self,
        thread_id: &ConnectionRequestId,
    ) -> SupabaseResult<Vec<Message>> {
        let filter = format!("eq.{}", thread_id);
        self.client
            .select(
                "messages",
                &[
                    ("connection_request_id", &filter),
                    ("order", "created_at.asc"),
                ],
            )
            .await
    }

    /// Insert a message row.
    pub async fn insert(&self, message: &Message) -> SupabaseResult<Message> {
        let inserted: Message = self.client.insert("messages", message).await?;
        info!(message_id = %inserted.id, thread_id = %inserted.connection_request_id, "Inserted message");
        Ok(inserted)
    }

    /// Flip one message to read.
    pub async fn mark_read(&self, message_id: &MessageId) -> SupabaseResult<()> {
        let filter = format!("eq.{}", message_id);
        self.client
            .update(
                "messages",
                &[("id", &filter)],
                &serde_json::json!({ "is_read": true }),
            )
            .await
    }

    /// Mark every message in the thread not authored by `reader` as read.
    pub async fn mark_thread_read(
        &self,
        thread_id: &ConnectionRequestId,
        reader: &ProfileId,
    ) -> SupabaseResult<()> {
        let thread_filter = format!("eq.{}", thread_id);
        let sender_filter = format!("neq.{}", reader);
        self.client
            .update(
                "messages",
                &[
                    ("connection_request_id", &thread_filter),
                    ("sender_profile_id", &sender_filter),
                    ("is_read", "eq.false"),
                ],
                &serde_json::json!({ "is_read": true }),
            )
            .await
    }
}

/// Repository for notification rows.
#[derive(Clone)]
pub struct NotificationRepo {
    client: SupabaseClient,
}

impl NotificationRepo {
    /// Fetch limit for the in-app list.
    pub const RECENT_LIMIT: usize = 50;

    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Most recent notifications for a recipient, newest first, capped at
    /// [`Self::RECENT_LIMIT`].
    pub async fn list_recent(&self, recipient: &ProfileId) -> SupabaseResult<Vec<Notification>> {
        let filter = format!("eq.{}", recipient);
        let limit = Self::RECENT_LIMIT.to_string();
        self.client
            .select(
                "notifications",
                &[
                    ("recipient_profile_id", &filter),
                    ("order", "created_at.desc"),
                    ("limit", &limit),
                ],
            )
            .await
    }

    /// Insert a notification row.
    pub async fn insert(&self, notification: &Notification) -> SupabaseResult<Notification> {
        let inserted: Notification = self.client.insert("notifications", notification).await?;
        info!(
            notification_id = %inserted.id,
            recipient = %inserted.recipient_profile_id,
            kind = inserted.payload.tag(),
            "Inserted notification"
        );
        Ok(inserted)
    }

    /// Flip one notification to read.
    ///
    /// The update is scoped to the recipient as well as the id: the
    /// service-role key bypasses row-level security, so an id belonging
    /// to another profile must match zero rows here rather than flip.
    pub async fn mark_read(
        &self,
        id: &NotificationId,
        recipient: &ProfileId,
    ) -> SupabaseResult<()> {
        let id_filter = format!("eq.{}", id);
        let recipient_filter = format!("eq.{}", recipient);
        self.client
            .update(
                "notifications",
                &[
                    ("id", &id_filter),
                    ("recipient_profile_id", &recipient_filter),
                ],
                &serde_json::json!({ "is_read": true }),
            )
            .await
    }

    /// Mark every unread notification for the recipient as read.
    pub async fn mark_all_read(&self, recipient: &ProfileId) -> SupabaseResult<()> {
        let filter = format!("eq.{}", recipient);
        self.client
            .update(
                "notifications",
                &[("recipient_profile_id", &filter), ("is_read", "eq.false")],
                &serde_json::json!({ "is_read": true }),
            )
            .await
    }
}

/// Repository for auth-user roles.
#[derive(Clone)]
pub struct UserRoleRepo {
    client: SupabaseClient,
}

#[derive(Serialize)]
struct GrantRoleRow<'a> {
    user_id: &'a str,
    role: &'a str,
}

impl UserRoleRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Grant a role to an auth user. Granting an already-held role is a
    /// no-op.
    pub async fn grant(&self, user_id: &str, role: &str) -> SupabaseResult<()> {
        let ignored = self
            .client
            .insert_ignore_duplicates::<_, serde_json::Value>(
                "user_roles",
                &GrantRoleRow { user_id, role },
            )
            .await?;
        if ignored.is_some() {
            info!(user_id = %user_id, role = %role, "Granted role");
        }
        Ok(())
    }
}

/// Repository for connection requests (read-only here; lifecycle is owned
/// by the connection flow, which this backend only observes).
#[derive(Clone)]
pub struct ConnectionRequestRepo {
    client: SupabaseClient,
}

impl ConnectionRequestRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Get a connection request by id.
    pub async fn get(
        &self,
        id: &ConnectionRequestId,
    ) -> SupabaseResult<Option<ConnectionRequest>> {
        let filter = format!("eq.{}", id);
        let rows: Vec<ConnectionRequest> = self
            .client
            .select("connection_requests", &[("id", &filter), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next())
    }
}

/// A profile's verification row: four check statuses plus the admin's
/// overall approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub profile_id: ProfileId,
    #[serde(flatten)]
    pub checks: VerificationChecks,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
}

/// Repository for verification rows.
#[derive(Clone)]
pub struct VerificationRepo {
    client: SupabaseClient,
}

impl VerificationRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// The verification row for a profile, if one exists yet.
    pub async fn for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> SupabaseResult<Option<VerificationRecord>> {
        let filter = format!("eq.{}", profile_id);
        let rows: Vec<VerificationRecord> = self
            .client
            .select(
                "verification_checks",
                &[("profile_id", &filter), ("limit", "1")],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

/// A delivery log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLog {
    pub kind: String,
    pub recipient: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Repository for the append-only `notification_logs` table.
#[derive(Clone)]
pub struct NotificationLogRepo {
    client: SupabaseClient,
}

impl NotificationLogRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Append one delivery outcome. Best-effort by contract; callers log
    /// and swallow the error.
    pub async fn record(
        &self,
        kind: &str,
        recipient: &str,
        status: DeliveryStatus,
        detail: Option<&str>,
    ) -> SupabaseResult<()> {
        let row = NotificationLog {
            kind: kind.to_string(),
            recipient: recipient.to_string(),
            status,
            detail: detail.map(str::to_string),
            created_at: Utc::now(),
        };
        let _: NotificationLog = self.client.insert("notification_logs", &row).await?;
        Ok(())
    }
}

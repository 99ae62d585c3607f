//! Per-session notification store.
//!
//! Holds the recent notifications for one profile, newest first, together
//! with an unread counter. Mutations hit the database first and adjust the
//! in-memory view only after the write succeeds; change-feed inserts are
//! applied idempotently so a redelivered row never double-counts.

use finlink_models::{Notification, NotificationId, ProfileId};
use finlink_supabase::NotificationRepo;
use tracing::debug;

use crate::error::ApiResult;

/// Session-scoped view over one profile's notifications.
pub struct NotificationStore {
    repo: NotificationRepo,
    profile_id: ProfileId,
    /// Newest first, as returned by the initial fetch.
    items: Vec<Notification>,
    unread: usize,
}

impl NotificationStore {
    /// Fetch the recent window for `profile_id` and build the store.
    pub async fn open(repo: NotificationRepo, profile_id: ProfileId) -> ApiResult<Self> {
        let items = repo.list_recent(&profile_id).await?;
        let unread = items.iter().filter(|n| !n.is_read).count();
        debug!(profile_id = %profile_id, count = items.len(), unread, "Loaded notifications");
        Ok(Self {
            repo,
            profile_id,
            items,
            unread,
        })
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Apply an inserted row from the change feed.
    ///
    /// Rows for other profiles and rows already present are dropped, so
    /// redelivery is harmless. Returns whether the row was actually added.
    pub fn apply_insert(&mut self, row: Notification) -> bool {
        if row.recipient_profile_id != self.profile_id {
            return false;
        }
        if self.items.iter().any(|n| n.id == row.id) {
            return false;
        }
        if !row.is_read {
            self.unread += 1;
        }
        self.items.insert(0, row);
        true
    }

    /// Mark a single notification read.
    ///
    /// The row is updated remotely even when it fell out of the local
    /// window; the counter only moves when a locally-unread row flips.
    /// The remote update is always recipient-scoped, so an id owned by
    /// another profile matches nothing.
    pub async fn mark_as_read(&mut self, id: &NotificationId) -> ApiResult<()> {
        if let Some(item) = self.items.iter().position(|n| n.id == *id) {
            if self.items[item].is_read {
                return Ok(());
            }
            self.repo.mark_read(id, &self.profile_id).await?;
            self.items[item].is_read = true;
            self.unread = self.unread.saturating_sub(1);
        } else {
            self.repo.mark_read(id, &self.profile_id).await?;
        }
        Ok(())
    }

    /// Mark every notification for this profile read, remote rows included.
    pub async fn mark_all_read(&mut self) -> ApiResult<()> {
        self.repo.mark_all_read(&self.profile_id).await?;
        for item in &mut self.items {
            item.is_read = true;
        }
        self.unread = 0;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn from_rows(
        repo: NotificationRepo,
        profile_id: ProfileId,
        items: Vec<Notification>,
    ) -> Self {
        let unread = items.iter().filter(|n| !n.is_read).count();
        Self {
            repo,
            profile_id,
            items,
            unread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finlink_models::{ConnectionRequestId, NotificationPayload};
    use finlink_supabase::{SupabaseClient, SupabaseConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo_for(url: &str) -> NotificationRepo {
        let config = SupabaseConfig {
            url: url.to_string(),
            service_role_key: "test-key".to_string(),
            timeout: std::time::Duration::from_secs(1),
            connect_timeout: std::time::Duration::from_secs(1),
            retry: Default::default(),
        };
        NotificationRepo::new(SupabaseClient::new(config).unwrap())
    }

    fn test_repo() -> NotificationRepo {
        repo_for("http://localhost:0")
    }

    fn sample(recipient: &ProfileId) -> Notification {
        Notification::for_recipient(
            recipient.clone(),
            NotificationPayload::NewMessage {
                connection_request_id: ConnectionRequestId::new(),
                sender_name: "Alice".to_string(),
            },
        )
    }

    #[test]
    fn test_apply_insert_increments_unread() {
        let profile = ProfileId::new();
        let mut store = NotificationStore::from_rows(test_repo(), profile.clone(), vec![]);

        assert!(store.apply_insert(sample(&profile)));
        assert_eq!(store.unread(), 1);
        assert_eq!(store.items().len(), 1);
    }

    #[test]
    fn test_apply_insert_prepends() {
        let profile = ProfileId::new();
        let first = sample(&profile);
        let second = sample(&profile);
        let mut store = NotificationStore::from_rows(test_repo(), profile, vec![]);

        store.apply_insert(first.clone());
        store.apply_insert(second.clone());

        assert_eq!(store.items()[0].id, second.id);
        assert_eq!(store.items()[1].id, first.id);
    }

    #[test]
    fn test_apply_insert_dedupes_by_id() {
        let profile = ProfileId::new();
        let row = sample(&profile);
        let mut store = NotificationStore::from_rows(test_repo(), profile, vec![]);

        assert!(store.apply_insert(row.clone()));
        assert!(!store.apply_insert(row));
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.unread(), 1);
    }

    #[test]
    fn test_apply_insert_ignores_other_recipients() {
        let profile = ProfileId::new();
        let other = ProfileId::new();
        let mut store = NotificationStore::from_rows(test_repo(), profile, vec![]);

        assert!(!store.apply_insert(sample(&other)));
        assert!(store.items().is_empty());
        assert_eq!(store.unread(), 0);
    }

    #[test]
    fn test_unread_counts_only_unread_rows() {
        let profile = ProfileId::new();
        let mut read = sample(&profile);
        read.is_read = true;
        let unread = sample(&profile);

        let store = NotificationStore::from_rows(test_repo(), profile, vec![unread, read]);
        assert_eq!(store.unread(), 1);
    }

    #[tokio::test]
    async fn test_mark_as_read_decrements_by_one() {
        let server = MockServer::start().await;
        let profile = ProfileId::from_string("p1");
        let first = sample(&profile);
        let second = sample(&profile);

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/notifications"))
            .and(query_param("id", format!("eq.{}", first.id)))
            .and(query_param("recipient_profile_id", "eq.p1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = NotificationStore::from_rows(
            repo_for(&server.uri()),
            profile,
            vec![second, first.clone()],
        );
        assert_eq!(store.unread(), 2);

        store.mark_as_read(&first.id).await.unwrap();
        assert_eq!(store.unread(), 1);
        assert!(store.items()[1].is_read);

        // Second call on an already-read row is a local no-op.
        store.mark_as_read(&first.id).await.unwrap();
        assert_eq!(store.unread(), 1);
    }

    #[tokio::test]
    async fn test_mark_as_read_unread_clamps_at_zero() {
        let server = MockServer::start().await;
        let profile = ProfileId::from_string("p1");
        let row = sample(&profile);

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/notifications"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut store =
            NotificationStore::from_rows(repo_for(&server.uri()), profile, vec![row.clone()]);

        store.mark_as_read(&row.id).await.unwrap();
        assert_eq!(store.unread(), 0);
        store.mark_as_read(&row.id).await.unwrap();
        assert_eq!(store.unread(), 0);
    }

    #[tokio::test]
    async fn test_mark_as_read_scopes_unknown_id_to_own_profile() {
        let server = MockServer::start().await;
        let profile = ProfileId::from_string("p1");

        // An id outside the local window still goes out, but filtered to
        // this recipient; a row owned by someone else matches nothing.
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/notifications"))
            .and(query_param("id", "eq.other-users-row"))
            .and(query_param("recipient_profile_id", "eq.p1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = NotificationStore::from_rows(repo_for(&server.uri()), profile, vec![]);
        store
            .mark_as_read(&NotificationId::from_string("other-users-row"))
            .await
            .unwrap();
        assert_eq!(store.unread(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_read_zeroes_unread_and_flips_rows() {
        let server = MockServer::start().await;
        let profile = ProfileId::from_string("p1");

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/notifications"))
            .and(query_param("recipient_profile_id", "eq.p1"))
            .and(query_param("is_read", "eq.false"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = NotificationStore::from_rows(
            repo_for(&server.uri()),
            profile.clone(),
            vec![sample(&profile), sample(&profile)],
        );
        assert_eq!(store.unread(), 2);

        store.mark_all_read().await.unwrap();
        assert_eq!(store.unread(), 0);
        assert!(store.items().iter().all(|n| n.is_read));
    }
}

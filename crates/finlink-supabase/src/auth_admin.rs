//! GoTrue admin API: auth-user provisioning.
//!
//! Used by the admin-user function endpoint. Creation is idempotent: an
//! "already registered" conflict resolves to the existing user instead of
//! an error.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};

use crate::client::SupabaseClient;
use crate::error::{SupabaseError, SupabaseResult};
use crate::metrics::record_request;
use crate::retry::with_retry;

/// An auth account as GoTrue reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
}

#[derive(Deserialize)]
struct ListUsersResponse {
    #[serde(default)]
    users: Vec<AuthUserRecord>,
}

/// Page size for the lookup fallback. GoTrue has no email filter on the
/// list endpoint, so pages are scanned in order until the address turns
/// up or the listing runs out.
const LOOKUP_PAGE_SIZE: u32 = 200;

/// Admin client over the GoTrue REST API.
#[derive(Clone)]
pub struct AuthAdminClient {
    client: SupabaseClient,
}

impl AuthAdminClient {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Create an auth user, or return the existing one if the email is
    /// already registered.
    pub async fn create_or_find_user(
        &self,
        email: &str,
        password: &str,
    ) -> SupabaseResult<AuthUserRecord> {
        match self.create_user(email, password).await {
            Ok(user) => {
                info!(user_id = %user.id, "Created auth user");
                Ok(user)
            }
            Err(SupabaseError::Conflict(_)) => {
                let existing = self.find_by_email(email).await?.ok_or_else(|| {
                    SupabaseError::invalid_response(
                        "auth user reported as registered but not found",
                    )
                })?;
                info!(user_id = %existing.id, "Auth user already exists");
                Ok(existing)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_user(&self, email: &str, password: &str) -> SupabaseResult<AuthUserRecord> {
        let url = self.client.auth_url("admin/users");
        let operation = "auth:create_user";

        with_retry(&self.client.config().retry, operation, || {
            let url = url.clone();
            async move {
                let start = Instant::now();
                let response = self
                    .client
                    .http()
                    .post(&url)
                    .headers(self.client.auth_headers())
                    .json(&CreateUserRequest {
                        email,
                        password,
                        email_confirm: true,
                    })
                    .send()
                    .await?;

                let status = response.status();
                record_request(operation, status.as_u16(), start.elapsed().as_millis() as f64);

                if status.is_success() {
                    Ok(response.json::<AuthUserRecord>().await?)
                } else {
                    Err(SupabaseClient::status_error(status, response).await)
                }
            }
        })
        .instrument(info_span!("gotrue_create_user"))
        .await
    }

    /// Look up an auth user by email, scanning the listing page by page.
    pub async fn find_by_email(&self, email: &str) -> SupabaseResult<Option<AuthUserRecord>> {
        let email_lower = email.to_lowercase();
        let mut page = 1u32;
        loop {
            let listed = self.list_users_page(page).await?;
            let count = listed.users.len();
            if let Some(user) = listed
                .users
                .into_iter()
                .find(|u| {
                    u.email.as_deref().map(str::to_lowercase).as_deref()
                        == Some(email_lower.as_str())
                })
            {
                return Ok(Some(user));
            }
            // A short page is the last page.
            if count < LOOKUP_PAGE_SIZE as usize {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn list_users_page(&self, page: u32) -> SupabaseResult<ListUsersResponse> {
        let url = format!(
            "{}?page={}&per_page={}",
            self.client.auth_url("admin/users"),
            page,
            LOOKUP_PAGE_SIZE
        );
        let operation = "auth:list_users";

        with_retry(&self.client.config().retry, operation, || {
            let url = url.clone();
            async move {
                let start = Instant::now();
                let response = self
                    .client
                    .http()
                    .get(&url)
                    .headers(self.client.auth_headers())
                    .send()
                    .await?;

                let status = response.status();
                record_request(operation, status.as_u16(), start.elapsed().as_millis() as f64);

                if status.is_success() {
                    Ok(response.json::<ListUsersResponse>().await?)
                } else {
                    Err(SupabaseClient::status_error(status, response).await)
                }
            }
        })
        .instrument(info_span!("gotrue_list_users"))
        .await
    }
}

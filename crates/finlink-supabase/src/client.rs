//! Supabase REST client.
//!
//! One client per process, cloned freely (the underlying reqwest client
//! is pooled). Table access goes through PostgREST; the service-role key
//! authenticates every request, so row-level security is bypassed and
//! recipient scoping is this crate's responsibility.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::error::{SupabaseError, SupabaseResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};

/// Supabase client configuration.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL (e.g. `https://xyz.supabase.co`).
    pub url: String,
    /// Service-role API key.
    pub service_role_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl SupabaseConfig {
    /// Create config from environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| SupabaseError::auth_error("SUPABASE_URL must be set"))?;

        if url.is_empty() {
            return Err(SupabaseError::auth_error("SUPABASE_URL cannot be empty"));
        }

        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| SupabaseError::auth_error("SUPABASE_SERVICE_ROLE_KEY must be set"))?;

        if service_role_key.is_empty() {
            return Err(SupabaseError::auth_error(
                "SUPABASE_SERVICE_ROLE_KEY cannot be empty",
            ));
        }

        let connect_timeout_secs: u64 = std::env::var("SUPABASE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            service_role_key,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        })
    }
}

/// Supabase REST client.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
    rest_base: String,
}

impl SupabaseClient {
    /// Create a new client.
    pub fn new(config: SupabaseConfig) -> SupabaseResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("finlink-supabase/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SupabaseError::Network)?;

        let rest_base = format!("{}/rest/v1", config.url);

        Ok(Self {
            http,
            config,
            rest_base,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        Self::new(SupabaseConfig::from_env()?)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Cheap reachability probe against the PostgREST root.
    pub async fn health_check(&self) -> SupabaseResult<()> {
        let response = self
            .http
            .get(&self.rest_base)
            .headers(self.auth_headers())
            .send()
            .await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(SupabaseError::ServerError(
                status.as_u16(),
                "health check failed".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// GoTrue endpoint URL.
    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}/{}", self.rest_base, table);
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    /// Standard auth headers for PostgREST and GoTrue.
    pub(crate) fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.config.service_role_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.config.service_role_key))
        {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers
    }

    /// Select rows from a table. `params` are raw PostgREST query pairs,
    /// e.g. `("recipient_profile_id", "eq.p1")`, `("order", "created_at.desc")`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, &str)],
    ) -> SupabaseResult<Vec<T>> {
        let url = self.table_url(table, params);
        let operation = format!("select:{}", table);

        with_retry(&self.config.retry, &operation, || {
            let url = url.clone();
            let operation = operation.clone();
            async move {
                let start = Instant::now();
                let response = self
                    .http
                    .get(&url)
                    .headers(self.auth_headers())
                    .send()
                    .await?;
                self.handle_json_response(&operation, response, start).await
            }
        })
        .instrument(info_span!("supabase_select", table = %table))
        .await
    }

    /// Insert a row, returning the inserted representation.
    pub async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> SupabaseResult<T> {
        match self.insert_with_prefer(table, row, "return=representation").await? {
            Some(inserted) => Ok(inserted),
            None => Err(SupabaseError::invalid_response(format!(
                "insert into {} returned no rows",
                table
            ))),
        }
    }

    /// Insert a row, treating a unique-constraint duplicate as a no-op.
    /// Returns `None` when the database ignored the write.
    pub async fn insert_ignore_duplicates<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> SupabaseResult<Option<T>> {
        self.insert_with_prefer(table, row, "resolution=ignore-duplicates,return=representation")
            .await
    }

    async fn insert_with_prefer<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
        prefer: &'static str,
    ) -> SupabaseResult<Option<T>> {
        let url = self.table_url(table, &[]);
        let operation = format!("insert:{}", table);
        let body = serde_json::to_value(row)?;

        let rows: Vec<T> = with_retry(&self.config.retry, &operation, || {
            let url = url.clone();
            let body = body.clone();
            let operation = operation.clone();
            async move {
                let start = Instant::now();
                let response = self
                    .http
                    .post(&url)
                    .headers(self.auth_headers())
                    .header("Prefer", prefer)
                    .json(&body)
                    .send()
                    .await?;
                self.handle_json_response(&operation, response, start).await
            }
        })
        .instrument(info_span!("supabase_insert", table = %table))
        .await?;

        Ok(rows.into_iter().next())
    }

    /// Update rows matching the filter params with a partial patch.
    pub async fn update(
        &self,
        table: &str,
        params: &[(&str, &str)],
        patch: &serde_json::Value,
    ) -> SupabaseResult<()> {
        let url = self.table_url(table, params);
        let operation = format!("update:{}", table);

        with_retry(&self.config.retry, &operation, || {
            let url = url.clone();
            let patch = patch.clone();
            let operation = operation.clone();
            async move {
                let start = Instant::now();
                let response = self
                    .http
                    .patch(&url)
                    .headers(self.auth_headers())
                    .header("Prefer", "return=minimal")
                    .json(&patch)
                    .send()
                    .await?;
                self.handle_empty_response(&operation, response, start).await
            }
        })
        .instrument(info_span!("supabase_update", table = %table))
        .await
    }

    async fn handle_json_response<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: Response,
        start: Instant,
    ) -> SupabaseResult<T> {
        let status = response.status();
        record_request(operation, status.as_u16(), start.elapsed().as_millis() as f64);

        if status.is_success() {
            debug!(operation = %operation, status = status.as_u16(), "Supabase request ok");
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                SupabaseError::invalid_response(format!("{} (body: {:.200})", e, body))
            })
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    async fn handle_empty_response(
        &self,
        operation: &str,
        response: Response,
        start: Instant,
    ) -> SupabaseResult<()> {
        let status = response.status();
        record_request(operation, status.as_u16(), start.elapsed().as_millis() as f64);

        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    pub(crate) async fn status_error(status: StatusCode, response: Response) -> SupabaseError {
        let retry_after_ms = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| secs * 1000);

        let detail = response.text().await.unwrap_or_default();
        SupabaseError::from_http_status_with_retry(status.as_u16(), detail, retry_after_ms)
    }
}

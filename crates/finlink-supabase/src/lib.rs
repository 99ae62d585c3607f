//! Supabase REST API client.
//!
//! Talks to the managed database over its REST surfaces:
//! - PostgREST for table reads/writes
//! - GoTrue admin API for auth-user provisioning
//!
//! Production concerns handled here:
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter, honoring Retry-After
//! - Observability (tracing spans, request metrics)

pub mod auth_admin;
pub mod client;
pub mod error;
pub mod metrics;
pub mod repos;
pub mod retry;

#[cfg(test)]
mod client_tests;

pub use auth_admin::AuthAdminClient;
pub use client::{SupabaseClient, SupabaseConfig};
pub use error::{SupabaseError, SupabaseResult};
pub use repos::{
    ConnectionRequestRepo, MessageRepo, NotificationLogRepo, NotificationRepo, ProfileRepo,
    UserRoleRepo, VerificationRecord, VerificationRepo,
};
pub use retry::RetryConfig;

//! Axum HTTP API server.
//!
//! This crate provides:
//! - The three serverless-style function endpoints (admin provisioning,
//!   notification dispatch, transactional email)
//! - REST surface for notifications, threads, and verification
//! - WebSocket delivery backed by the realtime change feed
//! - Supabase JWT session extraction
//! - Rate limiting, security headers, Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{EmailSender, GeocodeClient, MessageThread, NotificationDispatcher, NotificationStore};
pub use state::AppState;

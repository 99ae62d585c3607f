//! HTTP request handlers.

pub mod functions;
pub mod geocode;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod verification;

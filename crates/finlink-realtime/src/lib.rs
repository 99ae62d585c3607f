//! Realtime change feed.
//!
//! Fans out row-insert events over Redis pub/sub: one channel per
//! notification recipient, one per messaging thread. Delivery is
//! at-most-once per subscriber with no ordering guarantee beyond what
//! Redis provides; consumers dedupe by row id.

pub mod error;
pub mod feed;

pub use error::{RealtimeError, RealtimeResult};
pub use feed::{ChangeFeed, Subscription};

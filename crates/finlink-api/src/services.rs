//! Service layer: session-scoped stores and outbound side-effects.

pub mod dispatcher;
pub mod email;
pub mod geocode;
pub mod notifications;
pub mod thread;

pub use dispatcher::NotificationDispatcher;
pub use email::{EmailRequest, EmailSender};
pub use geocode::{GeocodeClient, GeocodePlace};
pub use notifications::NotificationStore;
pub use thread::MessageThread;

//! Adapters - Implementations of the ports.
//!
//! Every port ships with an in-memory reference implementation, suitable
//! for development, testing, and single-process deployments. Production
//! backends (databases, push gateways, per-user integration registries)
//! implement the same traits.

pub mod notifications;
pub mod registry;
pub mod store;
pub mod users;

pub use notifications::{InMemoryNotificationHandler, NotificationRecord};
pub use registry::InMemoryToolRegistry;
pub use store::{InMemoryAutomationStore, StoredLogEntry};
pub use users::StaticUserProvider;

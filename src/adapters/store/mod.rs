//! Automation store adapters.

mod in_memory;

pub use in_memory::{InMemoryAutomationStore, StoredLogEntry};

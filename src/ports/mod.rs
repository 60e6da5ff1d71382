//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the runtime and the outside world. Adapters implement these ports.
//!
//! ## Tool Registry Port
//!
//! - `ToolRegistry` - Tool lookup, listing, and one-shot invocation
//! - `Tool` / `ToolHandler` / `ToolOutput` - The tool contract
//!
//! ## Storage Port
//!
//! - `AutomationStore` - Automation CRUD, execution logs, and service
//!   capability metadata
//!
//! ## User Provider Port
//!
//! - `UserProvider` - Resolves the profile backing the `user` context key
//!
//! ## Notification Port
//!
//! - `NotificationHandler` - Out-of-band alerts (quota halts, failures)

mod automation_store;
mod notifications;
mod tool_registry;
mod user_provider;

pub use automation_store::{
    AutomationRecord, AutomationStore, AutomationUpdate, ExecutionLogEntry, NewAutomation,
    ServiceCapabilities, StoreError,
};
pub use notifications::{NotificationError, NotificationHandler};
pub use tool_registry::{RegistryError, Tool, ToolError, ToolHandler, ToolOutput, ToolRegistry};
pub use user_provider::{UserProvider, UserProviderError};

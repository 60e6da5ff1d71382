//! Automation Store Port - Interface for persistence and execution logs.
//!
//! The runtime itself holds no state between runs; deployed automations,
//! execution logs, and service capability metadata all live behind this
//! port. Implementations may use PostgreSQL, SQLite, or memory.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::automation::{AutomationSpec, DeploymentStatus, ExecutionStatus};
use crate::domain::foundation::{AutomationId, ExecutionId, UserId};

/// A persisted automation: the spec plus lifecycle metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRecord {
    /// Storage identifier.
    pub id: AutomationId,

    /// Owning user.
    pub user_id: UserId,

    /// The deployed specification.
    pub spec: AutomationSpec,

    /// Lifecycle status.
    pub status: DeploymentStatus,

    /// When the automation was created.
    pub created_at: DateTime<Utc>,

    /// When the user confirmed activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Next poll due time; polling automations only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_poll_at: Option<DateTime<Utc>>,

    /// Poll cadence in minutes; polling automations only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval_minutes: Option<u32>,

    /// Watermark date for incremental polling; polling automations only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_poll_cursor: Option<NaiveDate>,
}

/// Payload for creating an automation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAutomation {
    /// The specification to persist.
    pub spec: AutomationSpec,

    /// Initial lifecycle status.
    pub status: DeploymentStatus,

    /// Polling bookkeeping, set by the deployment workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_poll_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval_minutes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_poll_cursor: Option<NaiveDate>,
}

impl NewAutomation {
    /// Creates a pending-review automation with no polling bookkeeping.
    pub fn pending_review(spec: AutomationSpec) -> Self {
        Self {
            spec,
            status: DeploymentStatus::PendingReview,
            next_poll_at: None,
            polling_interval_minutes: None,
            last_poll_cursor: None,
        }
    }
}

/// Partial update applied to a stored automation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationUpdate {
    /// New lifecycle status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeploymentStatus>,

    /// Activation confirmation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Replacement specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<AutomationSpec>,

    /// New poll due time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_poll_at: Option<DateTime<Utc>>,

    /// New poll watermark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_poll_cursor: Option<NaiveDate>,
}

impl AutomationUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status.
    pub fn with_status(mut self, status: DeploymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the confirmation time.
    pub fn with_confirmed_at(mut self, at: DateTime<Utc>) -> Self {
        self.confirmed_at = Some(at);
        self
    }

    /// Sets the replacement spec.
    pub fn with_spec(mut self, spec: AutomationSpec) -> Self {
        self.spec = Some(spec);
        self
    }
}

/// One execution appended to the automation's log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// Final status of the run.
    pub status: ExecutionStatus,

    /// Actions that ran.
    pub actions_executed: u32,

    /// Actions that ran and failed.
    pub actions_failed: u32,

    /// Total wall-clock duration.
    pub duration_ms: u64,

    /// Consolidated error description, if anything failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,

    /// When the run finished.
    pub recorded_at: DateTime<Utc>,
}

impl From<&crate::domain::automation::ExecutionResult> for ExecutionLogEntry {
    fn from(result: &crate::domain::automation::ExecutionResult) -> Self {
        Self {
            status: result.status,
            actions_executed: result.actions_executed,
            actions_failed: result.actions_failed,
            duration_ms: result.duration_ms,
            error_summary: result.error_summary.clone(),
            recorded_at: Utc::now(),
        }
    }
}

/// Capability metadata for a service, used during authoring and
/// validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCapabilities {
    /// Whether the service can deliver webhooks.
    pub supports_webhooks: bool,

    /// Whether the service can be polled.
    pub supports_polling: bool,

    /// Free-text caveats for builders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Webhook event types the service emits.
    #[serde(default)]
    pub webhook_events: Vec<String>,

    /// Per-event payload schemas keyed by event type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_payload_schemas: Option<Value>,
}

/// Errors from the automation store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// The automation does not exist or is not owned by the user.
    #[error("automation not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Creates a backend failure error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Port for automation persistence and execution logging.
#[async_trait]
pub trait AutomationStore: Send + Sync {
    /// Gets an automation by id, verifying ownership.
    async fn get_automation(
        &self,
        id: &AutomationId,
        user_id: &UserId,
    ) -> Result<Option<AutomationRecord>, StoreError>;

    /// Persists a new automation and returns its id.
    async fn create_automation(
        &self,
        user_id: &UserId,
        automation: NewAutomation,
    ) -> Result<AutomationId, StoreError>;

    /// Applies a partial update. Returns false when the automation does
    /// not exist or is not owned by the user.
    async fn update_automation(
        &self,
        id: &AutomationId,
        user_id: &UserId,
        updates: AutomationUpdate,
    ) -> Result<bool, StoreError>;

    /// Deletes an automation. Returns false when nothing was deleted.
    async fn delete_automation(
        &self,
        id: &AutomationId,
        user_id: &UserId,
    ) -> Result<bool, StoreError>;

    /// Lists a user's automations, optionally filtered by status.
    async fn list_automations(
        &self,
        user_id: &UserId,
        status: Option<DeploymentStatus>,
    ) -> Result<Vec<AutomationRecord>, StoreError>;

    /// Appends an execution log entry and returns its id.
    async fn log_execution(
        &self,
        automation_id: &AutomationId,
        user_id: &UserId,
        entry: ExecutionLogEntry,
    ) -> Result<ExecutionId, StoreError>;

    /// Gets capability metadata for a service.
    async fn get_service_capabilities(
        &self,
        service_name: &str,
    ) -> Result<Option<ServiceCapabilities>, StoreError>;
}

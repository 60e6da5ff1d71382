//! Trigger types and their configuration shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::Condition;
use crate::domain::foundation::ValidationError;

/// How an automation is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Invoked explicitly by the user.
    Manual,
    /// Invoked by an inbound service event.
    Webhook,
    /// Invoked by a polling cycle against a source tool.
    Polling,
    /// Invoked once at a fixed time.
    ScheduleOnce,
    /// Invoked on a recurring schedule.
    ScheduleRecurring,
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerType::Manual => "manual",
            TriggerType::Webhook => "webhook",
            TriggerType::Polling => "polling",
            TriggerType::ScheduleOnce => "schedule_once",
            TriggerType::ScheduleRecurring => "schedule_recurring",
        };
        write!(f, "{}", s)
    }
}

/// Supported recurring schedule intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurringInterval {
    #[serde(rename = "5min")]
    Every5Min,
    #[serde(rename = "15min")]
    Every15Min,
    #[serde(rename = "30min")]
    Every30Min,
    #[serde(rename = "1hr")]
    Hourly,
    #[serde(rename = "6hr")]
    Every6Hours,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
}

/// Webhook trigger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookTrigger {
    /// Source service name (e.g. "Gmail").
    pub service: String,

    /// Event type delivered by the service.
    pub event_type: String,

    /// Optional event filter; events failing it never reach the runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Condition>,
}

/// Polling trigger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingTrigger {
    /// Source service name.
    pub service: String,

    /// Registry tool polled for new items.
    pub source_tool: String,

    /// Event type label attached to polled items.
    pub event_type: String,

    /// Parameters passed to the source tool; date built-ins allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_params: Option<Value>,

    /// Poll cadence in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval_minutes: Option<u32>,

    /// Optional per-item filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Condition>,
}

impl PollingTrigger {
    /// Parses a polling trigger out of a raw `trigger_config` document.
    pub fn from_config(config: &Value) -> Result<Self, ValidationError> {
        serde_json::from_value(config.clone()).map_err(|e| {
            ValidationError::invalid_format("trigger_config", e.to_string())
        })
    }
}

/// One-shot schedule configuration. `run_at` is an ISO datetime in the
/// user's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOnceTrigger {
    /// Always the literal "once".
    pub interval: String,

    /// When to run, user-local ISO datetime.
    pub run_at: String,
}

/// Recurring schedule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecurringTrigger {
    /// Recurrence cadence.
    pub interval: RecurringInterval,

    /// Local "HH:MM" for daily/weekly schedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,

    /// Day name for weekly schedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
}

/// Lifecycle status of a deployed automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Awaiting user confirmation before it can run.
    PendingReview,
    /// Runnable.
    Active,
    /// Suspended by the user.
    Paused,
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentStatus::PendingReview => "pending_review",
            DeploymentStatus::Active => "active",
            DeploymentStatus::Paused => "paused",
        };
        write!(f, "{}", s)
    }
}

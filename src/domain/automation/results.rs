//! Execution result records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Error identifier returned by service tools when a usage limit is hit.
pub const USAGE_LIMIT_ERROR: &str = "USAGE_LIMIT_EXCEEDED";

/// Status of an automation execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every executed action succeeded (or everything was skipped).
    Completed,
    /// Some actions failed, some succeeded.
    PartialFailure,
    /// Every executed action failed.
    Failed,
    /// Halted early on a structured usage-limit error.
    UsageLimitExceeded,
}

impl ExecutionStatus {
    /// Classifies the outcome from executed and failed counts.
    ///
    /// Skipped actions count in neither. All-skipped runs are complete.
    pub fn classify(executed: u32, failed: u32) -> Self {
        if failed == 0 {
            Self::Completed
        } else if failed < executed {
            Self::PartialFailure
        } else {
            Self::Failed
        }
    }

    /// Completed and partial runs count as overall success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::PartialFailure)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::PartialFailure => "partial_failure",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::UsageLimitExceeded => "usage_limit_exceeded",
        };
        write!(f, "{}", s)
    }
}

/// Result of a single action execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// The action's effective id.
    pub action_id: String,

    /// Tool the action named.
    pub tool: String,

    /// False only when the action executed and failed; skipped actions
    /// count as successful.
    pub success: bool,

    /// Wall-clock duration of this action.
    pub duration_ms: u64,

    /// Output value for successful actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    /// Error message for failed actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True when the condition evaluated false and the tool never ran.
    #[serde(default)]
    pub skipped: bool,

    /// Exact condition outcome when the action had a condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_result: Option<bool>,
}

impl ActionResult {
    /// Records a successful execution.
    pub fn succeeded(
        action_id: impl Into<String>,
        tool: impl Into<String>,
        duration_ms: u64,
        output: Option<Value>,
        condition_result: Option<bool>,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            tool: tool.into(),
            success: true,
            duration_ms,
            output,
            error: None,
            skipped: false,
            condition_result,
        }
    }

    /// Records a failed execution.
    pub fn failed(
        action_id: impl Into<String>,
        tool: impl Into<String>,
        duration_ms: u64,
        error: impl Into<String>,
        condition_result: Option<bool>,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            tool: tool.into(),
            success: false,
            duration_ms,
            output: None,
            error: Some(error.into()),
            skipped: false,
            condition_result,
        }
    }

    /// Records an action skipped by its condition.
    pub fn skipped(
        action_id: impl Into<String>,
        tool: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            tool: tool.into(),
            success: true,
            duration_ms,
            output: None,
            error: None,
            skipped: true,
            condition_result: Some(false),
        }
    }
}

/// Result of a full automation execution.
///
/// `action_results` preserves spec order, including skipped actions, and
/// always has one entry per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Overall success flag; see [`ExecutionStatus::is_success`].
    pub success: bool,

    /// Final classification.
    pub status: ExecutionStatus,

    /// Actions that ran (including failures, excluding skipped).
    pub actions_executed: u32,

    /// Actions that ran and failed.
    pub actions_failed: u32,

    /// Per-action results in spec order.
    pub action_results: Vec<ActionResult>,

    /// Total wall-clock duration.
    pub duration_ms: u64,

    /// Consolidated error description when anything failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
}

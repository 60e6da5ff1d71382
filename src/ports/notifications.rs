//! Notification Port - Interface for out-of-band user alerts.
//!
//! The executor notifies users when usage limits halt a run; callers may
//! also report failed automations or send custom alerts. Notification
//! failures are logged by callers and never escalate into execution
//! failures.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{AutomationId, UserId};

/// Errors from the notification backend.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// Delivery failed.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Port for sending notifications to users.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Notifies the user that a usage limit halted an automation.
    async fn notify_usage_limit_exceeded(
        &self,
        user_id: &UserId,
        automation_id: &AutomationId,
        automation_name: &str,
    ) -> Result<(), NotificationError>;

    /// Notifies the user that an automation failed.
    async fn notify_automation_failed(
        &self,
        user_id: &UserId,
        automation_id: &AutomationId,
        automation_name: &str,
        error_summary: Option<&str>,
    ) -> Result<(), NotificationError>;

    /// Sends a custom notification.
    async fn notify_custom(
        &self,
        user_id: &UserId,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError>;
}

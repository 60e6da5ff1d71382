//! In-memory notification handler implementation.
//!
//! Records every notification instead of delivering it. Useful for
//! development and for asserting on notification behavior in tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::{AutomationId, UserId};
use crate::ports::{NotificationError, NotificationHandler};

/// A recorded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationRecord {
    /// Usage limit halted an automation.
    UsageLimitExceeded {
        user_id: UserId,
        automation_id: AutomationId,
        automation_name: String,
    },
    /// An automation failed.
    AutomationFailed {
        user_id: UserId,
        automation_id: AutomationId,
        automation_name: String,
        error_summary: Option<String>,
    },
    /// Custom alert.
    Custom {
        user_id: UserId,
        title: String,
        body: String,
    },
}

/// In-memory implementation of the NotificationHandler port.
///
/// Thread-safe via internal `Mutex`.
#[derive(Default)]
pub struct InMemoryNotificationHandler {
    notifications: Mutex<Vec<NotificationRecord>>,
}

impl InMemoryNotificationHandler {
    /// Creates a new empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded notifications in delivery order.
    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.notifications.lock().unwrap().clone()
    }

    /// Clears all recorded notifications.
    pub fn clear(&self) {
        self.notifications.lock().unwrap().clear();
    }

    /// Returns the number of recorded notifications.
    pub fn len(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.notifications.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl NotificationHandler for InMemoryNotificationHandler {
    async fn notify_usage_limit_exceeded(
        &self,
        user_id: &UserId,
        automation_id: &AutomationId,
        automation_name: &str,
    ) -> Result<(), NotificationError> {
        self.notifications
            .lock()
            .unwrap()
            .push(NotificationRecord::UsageLimitExceeded {
                user_id: user_id.clone(),
                automation_id: *automation_id,
                automation_name: automation_name.to_string(),
            });
        Ok(())
    }

    async fn notify_automation_failed(
        &self,
        user_id: &UserId,
        automation_id: &AutomationId,
        automation_name: &str,
        error_summary: Option<&str>,
    ) -> Result<(), NotificationError> {
        self.notifications
            .lock()
            .unwrap()
            .push(NotificationRecord::AutomationFailed {
                user_id: user_id.clone(),
                automation_id: *automation_id,
                automation_name: automation_name.to_string(),
                error_summary: error_summary.map(str::to_string),
            });
        Ok(())
    }

    async fn notify_custom(
        &self,
        user_id: &UserId,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        self.notifications
            .lock()
            .unwrap()
            .push(NotificationRecord::Custom {
                user_id: user_id.clone(),
                title: title.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}

//! In-memory automation store implementation.
//!
//! This adapter provides an in-memory implementation of the
//! `AutomationStore` port. Useful for development, testing, and
//! single-process deployments without persistence requirements.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::automation::DeploymentStatus;
use crate::domain::foundation::{AutomationId, ExecutionId, UserId};
use crate::ports::{
    AutomationRecord, AutomationStore, AutomationUpdate, ExecutionLogEntry, NewAutomation,
    ServiceCapabilities, StoreError,
};

/// A logged execution with its storage context.
#[derive(Debug, Clone)]
pub struct StoredLogEntry {
    /// Log entry id.
    pub id: ExecutionId,
    /// Automation the run belonged to.
    pub automation_id: AutomationId,
    /// Owning user.
    pub user_id: UserId,
    /// The entry itself.
    pub entry: ExecutionLogEntry,
}

/// In-memory implementation of the AutomationStore port.
///
/// Thread-safe via internal `Mutex`. Does not persist data across
/// restarts.
#[derive(Default)]
pub struct InMemoryAutomationStore {
    automations: Mutex<HashMap<AutomationId, AutomationRecord>>,
    logs: Mutex<Vec<StoredLogEntry>>,
    capabilities: Mutex<HashMap<String, ServiceCapabilities>>,
}

impl InMemoryAutomationStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds capability metadata for a service.
    pub fn set_service_capabilities(
        &self,
        service_name: impl Into<String>,
        capabilities: ServiceCapabilities,
    ) {
        self.capabilities
            .lock()
            .unwrap()
            .insert(service_name.into(), capabilities);
    }

    /// Returns all logged executions in insertion order.
    ///
    /// Useful for testing and debugging.
    pub fn logs(&self) -> Vec<StoredLogEntry> {
        self.logs.lock().unwrap().clone()
    }

    /// Returns the number of stored automations.
    pub fn len(&self) -> usize {
        self.automations.lock().unwrap().len()
    }

    /// Returns true if no automations are stored.
    pub fn is_empty(&self) -> bool {
        self.automations.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl AutomationStore for InMemoryAutomationStore {
    async fn get_automation(
        &self,
        id: &AutomationId,
        user_id: &UserId,
    ) -> Result<Option<AutomationRecord>, StoreError> {
        let automations = self.automations.lock().unwrap();
        Ok(automations
            .get(id)
            .filter(|record| &record.user_id == user_id)
            .cloned())
    }

    async fn create_automation(
        &self,
        user_id: &UserId,
        automation: NewAutomation,
    ) -> Result<AutomationId, StoreError> {
        let id = AutomationId::new();
        let record = AutomationRecord {
            id,
            user_id: user_id.clone(),
            spec: automation.spec,
            status: automation.status,
            created_at: Utc::now(),
            confirmed_at: None,
            next_poll_at: automation.next_poll_at,
            polling_interval_minutes: automation.polling_interval_minutes,
            last_poll_cursor: automation.last_poll_cursor,
        };
        self.automations.lock().unwrap().insert(id, record);
        Ok(id)
    }

    async fn update_automation(
        &self,
        id: &AutomationId,
        user_id: &UserId,
        updates: AutomationUpdate,
    ) -> Result<bool, StoreError> {
        let mut automations = self.automations.lock().unwrap();
        let Some(record) = automations
            .get_mut(id)
            .filter(|record| &record.user_id == user_id)
        else {
            return Ok(false);
        };

        if let Some(status) = updates.status {
            record.status = status;
        }
        if let Some(confirmed_at) = updates.confirmed_at {
            record.confirmed_at = Some(confirmed_at);
        }
        if let Some(spec) = updates.spec {
            record.spec = spec;
        }
        if let Some(next_poll_at) = updates.next_poll_at {
            record.next_poll_at = Some(next_poll_at);
        }
        if let Some(cursor) = updates.last_poll_cursor {
            record.last_poll_cursor = Some(cursor);
        }
        Ok(true)
    }

    async fn delete_automation(
        &self,
        id: &AutomationId,
        user_id: &UserId,
    ) -> Result<bool, StoreError> {
        let mut automations = self.automations.lock().unwrap();
        let owned = automations
            .get(id)
            .map(|record| &record.user_id == user_id)
            .unwrap_or(false);
        if owned {
            automations.remove(id);
        }
        Ok(owned)
    }

    async fn list_automations(
        &self,
        user_id: &UserId,
        status: Option<DeploymentStatus>,
    ) -> Result<Vec<AutomationRecord>, StoreError> {
        let automations = self.automations.lock().unwrap();
        let mut listed: Vec<AutomationRecord> = automations
            .values()
            .filter(|record| &record.user_id == user_id)
            .filter(|record| status.map(|s| record.status == s).unwrap_or(true))
            .cloned()
            .collect();
        listed.sort_by_key(|record| record.created_at);
        Ok(listed)
    }

    async fn log_execution(
        &self,
        automation_id: &AutomationId,
        user_id: &UserId,
        entry: ExecutionLogEntry,
    ) -> Result<ExecutionId, StoreError> {
        let id = ExecutionId::new();
        self.logs.lock().unwrap().push(StoredLogEntry {
            id,
            automation_id: *automation_id,
            user_id: user_id.clone(),
            entry,
        });
        Ok(id)
    }

    async fn get_service_capabilities(
        &self,
        service_name: &str,
    ) -> Result<Option<ServiceCapabilities>, StoreError> {
        Ok(self.capabilities.lock().unwrap().get(service_name).cloned())
    }
}

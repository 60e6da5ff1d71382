//! Deployment workflow: validate, preflight, persist, activate.
//!
//! A spec enters the store only after the static validator (and, for
//! polling triggers, the live preflight) accepts it. New automations land
//! in `pending_review`; activation is a separate user-confirmed step that
//! stamps `confirmed_at`.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::preflight::PollingPreflight;
use super::validation::{AutomationValidator, BuilderContext};
use crate::domain::automation::{AutomationSpec, DeploymentStatus, TriggerType};
use crate::domain::foundation::{AutomationId, UserId};
use crate::ports::{AutomationStore, AutomationUpdate, NewAutomation, StoreError, ToolRegistry};

/// Poll cadence applied when the trigger config does not set one.
const DEFAULT_POLLING_INTERVAL_MINUTES: u32 = 60;

/// A successfully deployed automation.
#[derive(Debug, Clone)]
pub struct Deployed {
    /// Storage id of the new automation.
    pub automation_id: AutomationId,

    /// Initial lifecycle status.
    pub status: DeploymentStatus,

    /// Non-blocking preflight warnings surfaced to the user.
    pub warnings: Vec<String>,
}

/// Errors from the deployment workflow.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The spec failed validation or preflight; messages are
    /// user-facing.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Deploys validated automation specs into the store.
pub struct DeploymentService {
    store: Arc<dyn AutomationStore>,
    validator: AutomationValidator,
    preflight: PollingPreflight,
    run_preflight: bool,
}

impl DeploymentService {
    /// Creates a deployment service with preflight enabled.
    pub fn new(store: Arc<dyn AutomationStore>, registry: Arc<dyn ToolRegistry>) -> Self {
        Self {
            store,
            validator: AutomationValidator::new(registry.clone()),
            preflight: PollingPreflight::new(registry),
            run_preflight: true,
        }
    }

    /// Enables or disables the polling preflight probe.
    pub fn with_preflight(mut self, enabled: bool) -> Self {
        self.run_preflight = enabled;
        self
    }

    /// Validates and persists a spec in `pending_review` status.
    ///
    /// Polling automations get their bookkeeping fields stamped here:
    /// the first poll is due immediately and the cursor starts at the
    /// current UTC date.
    pub async fn deploy(
        &self,
        spec: AutomationSpec,
        user_id: &UserId,
        builder: Option<&BuilderContext>,
    ) -> Result<Deployed, DeployError> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let outcome = self.validator.validate(&spec, builder).await;
        errors.extend(outcome.errors);

        if self.run_preflight && spec.trigger_type == TriggerType::Polling {
            let preflight = self
                .preflight
                .run(&spec.trigger_config, &spec.actions, user_id)
                .await;
            errors.extend(preflight.errors);
            warnings.extend(preflight.warnings);
        }

        if !errors.is_empty() {
            return Err(DeployError::Validation(errors));
        }

        let automation = match spec.trigger_type {
            TriggerType::Polling => {
                let now = Utc::now();
                NewAutomation {
                    polling_interval_minutes: Some(polling_interval(&spec.trigger_config)),
                    next_poll_at: Some(now),
                    last_poll_cursor: Some(now.date_naive()),
                    ..NewAutomation::pending_review(spec)
                }
            }
            _ => NewAutomation::pending_review(spec),
        };

        let name = automation.spec.name.clone();
        let automation_id = self.store.create_automation(user_id, automation).await?;

        info!(automation = %name, id = %automation_id, "Automation deployed, pending review");

        Ok(Deployed {
            automation_id,
            status: DeploymentStatus::PendingReview,
            warnings,
        })
    }

    /// Activates a pending automation, stamping the confirmation time.
    ///
    /// Returns false when the automation does not exist or is not owned
    /// by the user.
    pub async fn activate(
        &self,
        automation_id: &AutomationId,
        user_id: &UserId,
    ) -> Result<bool, StoreError> {
        self.store
            .update_automation(
                automation_id,
                user_id,
                AutomationUpdate::new()
                    .with_status(DeploymentStatus::Active)
                    .with_confirmed_at(Utc::now()),
            )
            .await
    }
}

fn polling_interval(trigger_config: &Value) -> u32 {
    trigger_config
        .get("polling_interval_minutes")
        .and_then(Value::as_u64)
        .map(|minutes| minutes as u32)
        .unwrap_or(DEFAULT_POLLING_INTERVAL_MINUTES)
}

/// Renders a human-readable summary shown to the user before activation.
pub fn format_summary(spec: &AutomationSpec) -> String {
    let mut summary = format!("**{}**\n\n", spec.name);

    match spec.trigger_type {
        TriggerType::Polling => {
            let source = spec
                .trigger_config
                .get("source_tool")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            summary.push_str(&format!(
                "**Trigger:** Poll {} every {} minutes\n",
                source,
                polling_interval(&spec.trigger_config)
            ));
        }
        TriggerType::Webhook => {
            let service = spec
                .trigger_config
                .get("service")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let event = spec
                .trigger_config
                .get("event_type")
                .and_then(Value::as_str)
                .unwrap_or("any event");
            summary.push_str(&format!("**Trigger:** When {} sends {}\n", service, event));
        }
        TriggerType::ScheduleRecurring => {
            let interval = spec
                .trigger_config
                .get("interval")
                .and_then(Value::as_str)
                .unwrap_or("daily");
            summary.push_str(&format!("**Trigger:** {}", interval));
            if let Some(time) = spec.trigger_config.get("time_of_day").and_then(Value::as_str) {
                summary.push_str(&format!(" at {}", time));
            }
            summary.push('\n');
        }
        TriggerType::ScheduleOnce => {
            let run_at = spec
                .trigger_config
                .get("run_at")
                .and_then(Value::as_str)
                .unwrap_or("unknown time");
            summary.push_str(&format!("**Trigger:** Once at {}\n", run_at));
        }
        TriggerType::Manual => {
            summary.push_str("**Trigger:** manual\n");
        }
    }

    summary.push_str(&format!("\n**Actions:** ({} steps)\n", spec.actions.len()));
    for (index, action) in spec.actions.iter().enumerate() {
        summary.push_str(&format!("  {}. {}", index + 1, action.tool));
        if action.condition.is_some() {
            summary.push_str(" (conditional)");
        }
        summary.push('\n');
    }

    summary
}

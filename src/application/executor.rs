//! Automation Executor - drives the action list of one automation run.
//!
//! Execution is strictly sequential: condition gate, parameter
//! resolution, tool invocation under a per-action timeout, outcome
//! classification, output binding. Failures are soft (the run continues)
//! except for structured usage-limit errors, which halt the run and
//! notify the user. `execute` never fails; every outcome is encoded in
//! the returned [`ExecutionResult`].

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::automation::{
    Action, ActionResult, ExecutionResult, ExecutionStatus, USAGE_LIMIT_ERROR,
};
use crate::domain::conditions::evaluate_condition;
use crate::domain::foundation::{AutomationId, RequestId, UserInfo};
use crate::domain::output::{extract_json_from_text, normalize_output};
use crate::domain::templating::resolve_parameters;
use crate::ports::{NotificationHandler, ToolOutput, ToolRegistry};

/// Default per-action invocation timeout.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to run one automation.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Ordered action list from the spec.
    pub actions: Vec<Action>,

    /// User-declared constants, spread over the context last.
    pub variables: Map<String, Value>,

    /// Event payload from the trigger infrastructure.
    pub trigger_data: Value,

    /// Profile of the owning user.
    pub user_info: UserInfo,

    /// Automation identity, when executing a deployed automation.
    pub automation_id: Option<AutomationId>,

    /// Automation name used in notifications.
    pub automation_name: Option<String>,

    /// Correlation id threaded into every tool invocation.
    pub request_id: Option<RequestId>,
}

impl ExecutionRequest {
    /// Creates a request with empty variables and trigger data.
    pub fn new(actions: Vec<Action>, user_info: UserInfo) -> Self {
        Self {
            actions,
            variables: Map::new(),
            trigger_data: Value::Object(Map::new()),
            user_info,
            automation_id: None,
            automation_name: None,
            request_id: None,
        }
    }

    /// Sets the trigger payload.
    pub fn with_trigger_data(mut self, trigger_data: Value) -> Self {
        self.trigger_data = trigger_data;
        self
    }

    /// Sets the user variables.
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    /// Sets the automation identity.
    pub fn with_automation(
        mut self,
        automation_id: AutomationId,
        automation_name: impl Into<String>,
    ) -> Self {
        self.automation_id = Some(automation_id);
        self.automation_name = Some(automation_name.into());
        self
    }

    /// Sets the correlation id.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

/// Classified outcome of one tool invocation.
enum ToolOutcome {
    Success(Value),
    Failure(String),
    UsageLimit { service: String, message: String },
}

/// Sequential executor for declarative automations.
pub struct AutomationExecutor {
    registry: Arc<dyn ToolRegistry>,
    notifications: Option<Arc<dyn NotificationHandler>>,
    timeout_per_action: Duration,
}

impl AutomationExecutor {
    /// Creates an executor with the default per-action timeout and no
    /// notification handler.
    pub fn new(registry: Arc<dyn ToolRegistry>) -> Self {
        Self {
            registry,
            notifications: None,
            timeout_per_action: DEFAULT_ACTION_TIMEOUT,
        }
    }

    /// Sets the notification handler used on quota halts.
    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationHandler>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Overrides the per-action timeout.
    pub fn with_timeout(mut self, timeout_per_action: Duration) -> Self {
        self.timeout_per_action = timeout_per_action;
        self
    }

    /// Runs the automation to completion.
    ///
    /// Returns one [`ActionResult`] per spec action, in order. Skipped
    /// actions publish nothing; failed actions leave their `output_as`
    /// name unset.
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();
        let mut context = build_context(
            &request.trigger_data,
            &request.user_info,
            &request.variables,
        );

        info!(
            automation = request.automation_name.as_deref().unwrap_or("ad-hoc"),
            actions = request.actions.len(),
            "Executing automation"
        );

        let mut results: Vec<ActionResult> = Vec::with_capacity(request.actions.len());
        let mut executed: u32 = 0;
        let mut failed: u32 = 0;
        let mut failed_ids: Vec<String> = Vec::new();

        for (index, action) in request.actions.iter().enumerate() {
            let action_id = action.effective_id(index);
            let action_started = Instant::now();

            let condition_result = action
                .condition
                .as_ref()
                .map(|condition| evaluate_condition(Some(condition), &context));

            if condition_result == Some(false) {
                debug!(action = %action_id, "Condition false, skipping action");
                results.push(ActionResult::skipped(
                    action_id,
                    action.tool.clone(),
                    elapsed_ms(action_started),
                ));
                continue;
            }

            executed += 1;

            let resolved = resolve_parameters(&action.parameters, &context);
            let payload = self.inject_reserved_fields(resolved, &request);

            let outcome = match self.invoke_tool(&action.tool, payload.to_string()).await {
                Ok(output) => classify_output(output),
                Err(message) => ToolOutcome::Failure(message),
            };

            match outcome {
                ToolOutcome::Success(value) => {
                    let output = match &action.output_as {
                        Some(name) => {
                            let bound = prepare_binding(&action.tool, value);
                            if let Value::Object(map) = &mut context {
                                map.insert(name.clone(), bound.clone());
                            }
                            bound
                        }
                        None => value,
                    };
                    results.push(ActionResult::succeeded(
                        action_id,
                        action.tool.clone(),
                        elapsed_ms(action_started),
                        Some(output),
                        condition_result,
                    ));
                }
                ToolOutcome::Failure(message) => {
                    warn!(action = %action_id, error = %message, "Action failed, continuing");
                    failed += 1;
                    failed_ids.push(action_id.clone());
                    results.push(ActionResult::failed(
                        action_id,
                        action.tool.clone(),
                        elapsed_ms(action_started),
                        message,
                        condition_result,
                    ));
                }
                ToolOutcome::UsageLimit { service, message } => {
                    warn!(
                        action = %action_id,
                        service = %service,
                        "Usage limit exceeded, halting automation"
                    );
                    failed += 1;
                    self.send_usage_limit_notification(&request).await;
                    results.push(ActionResult::failed(
                        action_id,
                        action.tool.clone(),
                        elapsed_ms(action_started),
                        format!("Usage limit exceeded: {}", message),
                        condition_result,
                    ));
                    // One entry per spec action even on an early halt.
                    for (rest_index, rest) in
                        request.actions.iter().enumerate().skip(index + 1)
                    {
                        let mut unreached = ActionResult::skipped(
                            rest.effective_id(rest_index),
                            rest.tool.clone(),
                            0,
                        );
                        unreached.condition_result = None;
                        results.push(unreached);
                    }
                    return ExecutionResult {
                        success: false,
                        status: ExecutionStatus::UsageLimitExceeded,
                        actions_executed: executed,
                        actions_failed: failed,
                        action_results: results,
                        duration_ms: elapsed_ms(started),
                        error_summary: Some(format!("Usage limit exceeded for {}", service)),
                    };
                }
            }
        }

        let status = ExecutionStatus::classify(executed, failed);
        let error_summary = (failed > 0).then(|| {
            format!(
                "{} of {} actions failed: {}",
                failed,
                executed,
                failed_ids.join(", ")
            )
        });

        ExecutionResult {
            success: status.is_success(),
            status,
            actions_executed: executed,
            actions_failed: failed,
            action_results: results,
            duration_ms: elapsed_ms(started),
            error_summary,
        }
    }

    /// Looks up and invokes a tool under the per-action timeout.
    async fn invoke_tool(&self, tool_name: &str, payload: String) -> Result<ToolOutput, String> {
        let Some(tool) = self.registry.get_tool_by_name(tool_name).await else {
            return Err(format!("Tool not found: {}", tool_name));
        };

        match timeout(self.timeout_per_action, (tool.handler)(payload)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!(
                "Tool '{}' timed out after {}s",
                tool_name,
                self.timeout_per_action.as_secs()
            )),
        }
    }

    /// Injects the fields every tool receives alongside its parameters.
    fn inject_reserved_fields(&self, mut params: Value, request: &ExecutionRequest) -> Value {
        if let Value::Object(map) = &mut params {
            map.insert(
                "user_id".to_string(),
                Value::String(request.user_info.id.as_str().to_string()),
            );
            if let Some(request_id) = &request.request_id {
                map.insert(
                    "request_id".to_string(),
                    Value::String(request_id.as_str().to_string()),
                );
            }
            map.insert("is_automation".to_string(), Value::Bool(true));
        }
        params
    }

    async fn send_usage_limit_notification(&self, request: &ExecutionRequest) {
        let (Some(notifications), Some(automation_id)) =
            (&self.notifications, &request.automation_id)
        else {
            return;
        };

        let name = request
            .automation_name
            .as_deref()
            .unwrap_or("Unnamed Automation");
        if let Err(err) = notifications
            .notify_usage_limit_exceeded(&request.user_info.id, automation_id, name)
            .await
        {
            // Notification failures never escalate into execution failures.
            warn!("Failed to send usage-limit notification: {}", err);
        }
    }
}

/// Composes the execution context.
///
/// Layering order: trigger data spread at the root for `{{field}}`
/// shortcuts, then the reserved `user` and `trigger_data` keys (written
/// after the spread so it cannot shadow them), then user variables on
/// top. Variables win by documented precedence, including over the
/// reserved names.
pub fn build_context(
    trigger_data: &Value,
    user_info: &UserInfo,
    variables: &Map<String, Value>,
) -> Value {
    let mut context = Map::new();

    if let Value::Object(fields) = trigger_data {
        for (key, value) in fields {
            context.insert(key.clone(), value.clone());
        }
    }

    context.insert(
        "user".to_string(),
        serde_json::to_value(user_info).unwrap_or(Value::Null),
    );
    context.insert("trigger_data".to_string(), trigger_data.clone());

    for (key, value) in variables {
        context.insert(key.clone(), value.clone());
    }

    Value::Object(context)
}

/// Classifies a raw tool output per the failure and quota conventions.
fn classify_output(output: ToolOutput) -> ToolOutcome {
    let value = match output {
        ToolOutput::Text(text) => {
            if text.starts_with("Error:") {
                return ToolOutcome::Failure(text);
            }
            match serde_json::from_str(&text) {
                Ok(parsed) => parsed,
                Err(_) => Value::String(text),
            }
        }
        ToolOutput::Document(value) => value,
    };

    if let Value::Object(map) = &value {
        if map.get("error").and_then(Value::as_str) == Some(USAGE_LIMIT_ERROR) {
            let service = map
                .get("service")
                .and_then(Value::as_str)
                .unwrap_or("unknown service")
                .to_string();
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Usage limit reached")
                .to_string();
            return ToolOutcome::UsageLimit { service, message };
        }
    }

    ToolOutcome::Success(value)
}

/// Prepares a successful output for context binding: extract embedded
/// JSON out of residual strings, then normalize mapping shapes.
fn prepare_binding(tool: &str, value: Value) -> Value {
    let mut prepared = value;
    if let Value::String(text) = &prepared {
        if let Some(extracted) = extract_json_from_text(text) {
            info!("Extracted embedded JSON from '{}' output", tool);
            prepared = extracted;
        }
    }
    if prepared.is_object() {
        prepared = normalize_output(&prepared);
    }
    prepared
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

//! The declarative automation specification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Condition, TriggerType};

/// A single step: one tool invocation with optional gating and binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Identifier unique within the automation; `action_<index>` when
    /// omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Registry name of the tool to invoke.
    pub tool: String,

    /// Tool parameters; string leaves may contain `{{…}}` placeholders.
    #[serde(default = "empty_parameters")]
    pub parameters: Value,

    /// When present and false at runtime, the action is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,

    /// Context name under which the normalized output is published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_as: Option<String>,
}

fn empty_parameters() -> Value {
    Value::Object(Map::new())
}

impl Action {
    /// Creates an action invoking `tool` with empty parameters.
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            id: None,
            tool: tool.into(),
            parameters: empty_parameters(),
            condition: None,
            output_as: None,
        }
    }

    /// Sets the action id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the parameters document.
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the gating condition.
    pub fn with_condition(mut self, condition: impl Into<Condition>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Sets the output binding name.
    pub fn with_output_as(mut self, name: impl Into<String>) -> Self {
        self.output_as = Some(name.into());
        self
    }

    /// The id used in results and error messages: explicit id, or
    /// `action_<index>` synthesized from the position in the spec.
    pub fn effective_id(&self, index: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("action_{}", index))
    }
}

/// A deployed automation definition: a trigger bound to an ordered list of
/// actions, plus user-declared constants seeded into the execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationSpec {
    /// Human-readable name.
    pub name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// How the automation is invoked.
    pub trigger_type: TriggerType,

    /// Trigger configuration; its schema depends on `trigger_type`.
    #[serde(default = "empty_parameters")]
    pub trigger_config: Value,

    /// User-supplied constants, spread over the context last so they win.
    #[serde(default)]
    pub variables: Map<String, Value>,

    /// Ordered action list.
    pub actions: Vec<Action>,
}

impl AutomationSpec {
    /// Creates a spec with the given name and trigger type, no actions.
    pub fn new(name: impl Into<String>, trigger_type: TriggerType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            trigger_type,
            trigger_config: empty_parameters(),
            variables: Map::new(),
            actions: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the trigger configuration document.
    pub fn with_trigger_config(mut self, config: Value) -> Self {
        self.trigger_config = config;
        self
    }

    /// Adds a user variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Appends an action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::automation::{ComparisonOp, ConditionClause};
    use serde_json::json;

    #[test]
    fn effective_id_prefers_explicit_id() {
        let action = Action::new("send_email").with_id("notify");
        assert_eq!(action.effective_id(3), "notify");
    }

    #[test]
    fn effective_id_synthesizes_from_index() {
        let action = Action::new("send_email");
        assert_eq!(action.effective_id(3), "action_3");
    }

    #[test]
    fn action_deserializes_with_minimal_fields() {
        let action: Action = serde_json::from_value(json!({"tool": "get_score"})).unwrap();
        assert_eq!(action.tool, "get_score");
        assert_eq!(action.parameters, json!({}));
        assert!(action.condition.is_none());
        assert!(action.output_as.is_none());
    }

    #[test]
    fn spec_roundtrips_through_json() {
        let spec = AutomationSpec::new("Sleep alert", TriggerType::Polling)
            .with_description("Notify on poor sleep")
            .with_trigger_config(json!({
                "service": "Oura",
                "source_tool": "oura_get_daily_sleep",
                "event_type": "new_sleep_data"
            }))
            .with_variable("threshold", json!(70))
            .with_action(
                Action::new("send_notification")
                    .with_id("notify")
                    .with_parameters(json!({"body": "Score: {{trigger_data.score}}"}))
                    .with_condition(ConditionClause::new(
                        "trigger_data.score",
                        ComparisonOp::LessThan,
                        json!("{{threshold}}"),
                    ))
                    .with_output_as("notification"),
            );

        let value = serde_json::to_value(&spec).unwrap();
        let back: AutomationSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn spec_deserializes_from_authored_json() {
        let spec: AutomationSpec = serde_json::from_value(json!({
            "name": "Morning digest",
            "trigger_type": "schedule_recurring",
            "trigger_config": {"interval": "daily", "time_of_day": "07:00"},
            "actions": [
                {"tool": "gmail_list_messages", "output_as": "emails"},
                {"tool": "send_notification", "parameters": {"body": "{{emails}}"}}
            ]
        }))
        .unwrap();

        assert_eq!(spec.actions.len(), 2);
        assert_eq!(spec.description, "");
        assert!(spec.variables.is_empty());
    }
}

//! Static validation of automation specs before deployment.
//!
//! Checks are structural and referential: placeholder syntax, trigger
//! shape mismatches, tool existence, condition structure, and the
//! discovery-before-use discipline for assisted builders. Problems come
//! back as human-readable messages with remediation hints, never as
//! errors raised mid-check.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::automation::{AutomationSpec, TriggerType};
use crate::ports::ToolRegistry;

static BLOCK_SYNTAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[#/][^}]*\}\}").expect("block syntax pattern"));

static EVENT_DATA_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{event_data\.[^}]+\}\}").expect("event_data pattern"));

static WEBHOOK_ARRAY_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{(?:trigger_data\.)?(\d+)\.[^}]+\}\}").expect("webhook array pattern")
});

/// Result of validating a spec: a verdict plus the collected messages.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// Human-readable problems; empty when the spec is acceptable.
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    /// True when no problems were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Schema of a tool as fetched during assisted authoring.
#[derive(Debug, Clone)]
pub struct FetchedToolSchema {
    /// Declared parameter document.
    pub parameters: Value,

    /// Declared return description.
    pub returns: Option<String>,
}

/// Tracks which tool schemas an assisted builder fetched while authoring.
///
/// The validator uses this to enforce a discovery-before-use discipline:
/// a spec may only reference tools whose schemas were actually fetched,
/// with parameters the schemas actually declare.
#[derive(Debug, Clone, Default)]
pub struct BuilderContext {
    fetched: HashMap<String, FetchedToolSchema>,
}

impl BuilderContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a tool's schema was fetched.
    pub fn record_fetched_tool(
        &mut self,
        name: impl Into<String>,
        parameters: Value,
        returns: Option<String>,
    ) {
        self.fetched
            .insert(name.into(), FetchedToolSchema { parameters, returns });
    }

    /// Checks whether a tool's schema has been fetched.
    pub fn has_fetched_tool(&self, name: &str) -> bool {
        self.fetched.contains_key(name)
    }

    /// Gets a fetched schema by tool name.
    pub fn fetched(&self, name: &str) -> Option<&FetchedToolSchema> {
        self.fetched.get(name)
    }

    fn declared_parameter_names(&self, tool: &str) -> Option<Vec<&str>> {
        let schema = self.fetched(tool)?;
        let map = match schema.parameters.get("properties") {
            Some(Value::Object(props)) => props,
            _ => match &schema.parameters {
                Value::Object(map) => map,
                _ => return Some(Vec::new()),
            },
        };
        Some(map.keys().map(|k| k.as_str()).collect())
    }
}

/// Static validator for automation specs.
pub struct AutomationValidator {
    registry: Arc<dyn ToolRegistry>,
}

impl AutomationValidator {
    /// Creates a validator backed by the given registry.
    pub fn new(registry: Arc<dyn ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Validates a spec, optionally enforcing the builder's
    /// fetched-schema record.
    pub async fn validate(
        &self,
        spec: &AutomationSpec,
        builder: Option<&BuilderContext>,
    ) -> ValidationOutcome {
        let mut errors = Vec::new();

        if spec.actions.is_empty() {
            errors.push("actions must be a non-empty array".to_string());
            return ValidationOutcome { errors };
        }

        let actions_doc = match serde_json::to_value(&spec.actions) {
            Ok(doc) => doc,
            Err(err) => {
                errors.push(format!("actions could not be serialized: {}", err));
                return ValidationOutcome { errors };
            }
        };

        check_block_syntax(&actions_doc, "actions", &mut errors);
        check_event_data_prefix(&actions_doc, "actions", &mut errors);

        if spec.trigger_type == TriggerType::Webhook {
            check_webhook_array_syntax(&actions_doc, "actions", &mut errors);
            if let Some(filters) = spec.trigger_config.get("filters") {
                check_webhook_array_syntax(filters, "trigger_config.filters", &mut errors);
            }
        }

        for (index, action) in spec.actions.iter().enumerate() {
            let action_id = action.effective_id(index);

            if action.tool.is_empty() {
                errors.push(format!("{}: missing 'tool' field", action_id));
                continue;
            }

            if self.registry.get_tool_by_name(&action.tool).await.is_none() {
                errors.push(format!("{}: unknown tool '{}'", action_id, action.tool));
                continue;
            }

            if let Some(condition) = &action.condition {
                errors.extend(condition.structural_errors(&action_id));
            }

            if let Some(builder) = builder {
                check_fetched_schema(builder, action, &action_id, &mut errors);
            }
        }

        ValidationOutcome { errors }
    }
}

fn check_fetched_schema(
    builder: &BuilderContext,
    action: &crate::domain::automation::Action,
    action_id: &str,
    errors: &mut Vec<String>,
) {
    let Some(declared) = builder.declared_parameter_names(&action.tool) else {
        errors.push(format!(
            "{}: tool '{}' was used without fetching its schema first. \
             Fetch tool definitions before deploying.",
            action_id, action.tool
        ));
        return;
    };

    if let Value::Object(params) = &action.parameters {
        for name in params.keys() {
            if !declared.contains(&name.as_str()) {
                errors.push(format!(
                    "{}: parameter '{}' is not declared by tool '{}'",
                    action_id, name, action.tool
                ));
            }
        }
    }
}

/// Walks every string leaf of a document, reporting its dotted location.
fn walk_strings(value: &Value, path: &str, visit: &mut impl FnMut(&str, &str)) {
    match value {
        Value::String(s) => visit(s, path),
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                walk_strings(child, &child_path, visit);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk_strings(item, &format!("{}[{}]", path, index), visit);
            }
        }
        _ => {}
    }
}

fn check_block_syntax(value: &Value, root: &str, errors: &mut Vec<String>) {
    walk_strings(value, root, &mut |text, path| {
        let matches: Vec<&str> = BLOCK_SYNTAX
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();
        if !matches.is_empty() {
            errors.push(format!(
                "Handlebars block syntax not supported at '{}': {:?}. \
                 Use action conditions for conditional content.",
                path, matches
            ));
        }
    });
}

fn check_event_data_prefix(value: &Value, root: &str, errors: &mut Vec<String>) {
    walk_strings(value, root, &mut |text, path| {
        let matches: Vec<&str> = EVENT_DATA_PREFIX
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();
        if !matches.is_empty() {
            let suggestions: Vec<String> = matches
                .iter()
                .map(|m| m.replace("{{event_data.", "{{trigger_data."))
                .collect();
            errors.push(format!(
                "Invalid template at '{}': '{{{{event_data.' is not supported, \
                 use '{{{{trigger_data.' instead. Found: {:?}. Suggested fix: {:?}",
                path, matches, suggestions
            ));
        }
    });
}

fn check_webhook_array_syntax(value: &Value, root: &str, errors: &mut Vec<String>) {
    walk_strings(value, root, &mut |text, path| {
        if let Some(caps) = WEBHOOK_ARRAY_ACCESS.captures(text) {
            errors.push(format!(
                "Webhook automation at '{}' uses array syntax {{{{trigger_data.{}.field}}}}. \
                 Webhook payloads are flat objects; use {{{{field}}}} instead.",
                path, &caps[1]
            ));
        }
    });
}

//! Polling preflight - a live dry-run performed at deploy time.
//!
//! A polling automation is only as good as the `trigger_data.*` paths its
//! actions reference. Before deployment the preflight invokes the source
//! tool once and verifies that every referenced path resolves against a
//! real sample, catching shape mismatches while the builder can still fix
//! them. The probe has real side effects (it may count against per-user
//! quotas), so callers run it once per deployment, not per edit.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::domain::automation::{Action, Condition};
use crate::domain::foundation::{DateContext, UserId};
use crate::domain::templating::{builtin_value, resolve_path};
use crate::ports::{ToolOutput, ToolRegistry};

static TRIGGER_DATA_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*trigger_data\.([^}]+?)\s*\}\}").expect("trigger ref pattern"));

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern"));

/// Prefix stripped from collected references before resolution.
const TRIGGER_DATA_PREFIX: &str = "trigger_data.";

/// Result of a preflight run.
#[derive(Debug, Clone, Default)]
pub struct PreflightOutcome {
    /// Blocking problems: referenced paths that did not resolve.
    pub errors: Vec<String>,

    /// Non-blocking problems: the source tool could not be exercised.
    pub warnings: Vec<String>,

    /// The sample output the paths were checked against, when available.
    pub sample: Option<Value>,
}

impl PreflightOutcome {
    /// True when no blocking problems were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn passed() -> Self {
        Self::default()
    }

    fn soft_warning(message: String) -> Self {
        Self {
            errors: Vec::new(),
            warnings: vec![message],
            sample: None,
        }
    }
}

/// Live dry-run validator for polling automations.
pub struct PollingPreflight {
    registry: Arc<dyn ToolRegistry>,
    invocation_timeout: Duration,
}

impl PollingPreflight {
    /// Creates a preflight with the default 30 s invocation timeout.
    pub fn new(registry: Arc<dyn ToolRegistry>) -> Self {
        Self {
            registry,
            invocation_timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the invocation timeout.
    pub fn with_timeout(mut self, invocation_timeout: Duration) -> Self {
        self.invocation_timeout = invocation_timeout;
        self
    }

    /// Runs the preflight against a polling `trigger_config`.
    pub async fn run(
        &self,
        trigger_config: &Value,
        actions: &[Action],
        user_id: &UserId,
    ) -> PreflightOutcome {
        let Some(source_tool) = trigger_config.get("source_tool").and_then(Value::as_str) else {
            return PreflightOutcome {
                errors: vec!["polling trigger_config is missing 'source_tool'".to_string()],
                warnings: Vec::new(),
                sample: None,
            };
        };

        if self.registry.get_tool_by_name(source_tool).await.is_none() {
            return PreflightOutcome {
                errors: vec![format!("unknown polling source tool '{}'", source_tool)],
                warnings: Vec::new(),
                sample: None,
            };
        }

        let paths = collect_trigger_data_paths(actions, trigger_config);
        if paths.is_empty() {
            return PreflightOutcome::passed();
        }

        let tool_params = trigger_config
            .get("tool_params")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        // The probe runs before any user context exists, so date built-ins
        // resolve against UTC.
        let dates = DateContext::for_timezone(None);
        let resolved_params = resolve_date_builtins(&tool_params, &dates);

        info!(tool = source_tool, "Running polling preflight probe");

        let invocation = timeout(
            self.invocation_timeout,
            self.registry
                .execute_tool(source_tool, &resolved_params, user_id),
        )
        .await;

        let sample = match invocation {
            Err(_) => {
                return PreflightOutcome::soft_warning(unverified_message(
                    source_tool,
                    &format!("timed out after {}s", self.invocation_timeout.as_secs()),
                    &paths,
                ));
            }
            Ok(Err(err)) => {
                warn!(tool = source_tool, error = %err, "Preflight probe failed");
                return PreflightOutcome::soft_warning(unverified_message(
                    source_tool,
                    &err.to_string(),
                    &paths,
                ));
            }
            Ok(Ok(ToolOutput::Document(value))) => value,
            Ok(Ok(ToolOutput::Text(text))) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) => {
                    return PreflightOutcome::soft_warning(unverified_message(
                        source_tool,
                        "tool returned non-JSON output",
                        &paths,
                    ));
                }
            },
        };

        let unresolved: Vec<&String> = paths
            .iter()
            .filter(|path| {
                let stripped = path
                    .strip_prefix(TRIGGER_DATA_PREFIX)
                    .unwrap_or(path.as_str());
                resolve_path(&sample, stripped).is_none()
            })
            .collect();

        if unresolved.is_empty() {
            return PreflightOutcome {
                errors: Vec::new(),
                warnings: Vec::new(),
                sample: Some(sample),
            };
        }

        let hint = sample_shape_hint(&sample);
        let errors = unresolved
            .iter()
            .map(|path| {
                format!(
                    "'{}' did not resolve against a live sample from '{}'. {}",
                    path, source_tool, hint
                )
            })
            .collect();

        PreflightOutcome {
            errors,
            warnings: Vec::new(),
            sample: Some(sample),
        }
    }
}

/// Harvests every `trigger_data.*` reference from action parameters,
/// action conditions, and the trigger filter.
fn collect_trigger_data_paths(actions: &[Action], trigger_config: &Value) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();

    if let Ok(actions_doc) = serde_json::to_value(actions) {
        collect_refs_from_strings(&actions_doc, &mut paths);
    }

    for action in actions {
        if let Some(condition) = &action.condition {
            collect_refs_from_condition(condition, &mut paths);
        }
    }

    for key in ["filter", "filters"] {
        let Some(filter) = trigger_config.get(key) else {
            continue;
        };
        if let Ok(condition) = serde_json::from_value::<Condition>(filter.clone()) {
            collect_refs_from_condition(&condition, &mut paths);
        }
    }

    paths
}

fn collect_refs_from_strings(value: &Value, paths: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for caps in TRIGGER_DATA_REF.captures_iter(s) {
                paths.insert(format!("{}{}", TRIGGER_DATA_PREFIX, caps[1].trim()));
            }
        }
        Value::Object(map) => {
            for child in map.values() {
                collect_refs_from_strings(child, paths);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs_from_strings(item, paths);
            }
        }
        _ => {}
    }
}

fn collect_refs_from_condition(condition: &Condition, paths: &mut BTreeSet<String>) {
    for path in condition.paths() {
        if path.starts_with(TRIGGER_DATA_PREFIX) {
            paths.insert(path.to_string());
        }
    }
}

/// Substitutes date built-ins in a parameters document, leaving every
/// other placeholder untouched.
fn resolve_date_builtins(params: &Value, dates: &DateContext) -> Value {
    match params {
        Value::String(s) => Value::String(
            PLACEHOLDER
                .replace_all(s, |caps: &regex::Captures<'_>| {
                    builtin_value(caps[1].trim(), dates)
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_date_builtins(v, dates)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_date_builtins(item, dates))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn unverified_message(source_tool: &str, reason: &str, paths: &BTreeSet<String>) -> String {
    let listed: Vec<&str> = paths.iter().map(String::as_str).collect();
    format!(
        "Could not verify trigger_data paths against '{}' ({}). Unverified paths: {}",
        source_tool,
        reason,
        listed.join(", ")
    )
}

/// Describes the sample's shape for error messages: the first five
/// top-level keys of a mapping, or of element 0 of a sequence.
fn sample_shape_hint(sample: &Value) -> String {
    match sample {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().take(5).map(String::as_str).collect();
            format!("Sample is an object with keys [{}]", keys.join(", "))
        }
        Value::Array(items) => match items.first() {
            Some(Value::Object(first)) => {
                let keys: Vec<&str> = first.keys().take(5).map(String::as_str).collect();
                format!(
                    "Sample is an array whose first element has keys [{}]",
                    keys.join(", ")
                )
            }
            Some(_) => "Sample is an array of non-object values".to_string(),
            None => "Sample is an empty array".to_string(),
        },
        other => format!("Sample is a {} value", value_kind(other)),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! `{{…}}` placeholder substitution.
//!
//! Placeholder bodies are resolved in two stages: built-in date/time names
//! first, then a path lookup against the execution context. Missing values
//! degrade to a sentinel string instead of failing the execution.

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::path::resolve_path;
use crate::domain::foundation::DateContext;

/// Literal substituted for placeholders that resolve to nothing.
pub const MISSING_VALUE_SENTINEL: &str = "[No available data]";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern"));

/// Substitutes every `{{…}}` occurrence in `template` against `context`.
///
/// Date built-ins are computed against the timezone found at
/// `user.timezone` in the context (UTC fallback). Structured values are
/// JSON-encoded into the output; unresolved placeholders become
/// [`MISSING_VALUE_SENTINEL`] with a logged warning.
pub fn resolve_template(template: &str, context: &Value) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }
    let dates = date_context_for(context);
    resolve_template_at(template, context, &dates)
}

/// Recursively resolves placeholders in a parameters document.
///
/// Strings are template-resolved; mappings and sequences are walked;
/// other leaves pass through unchanged.
pub fn resolve_parameters(params: &Value, context: &Value) -> Value {
    let dates = date_context_for(context);
    resolve_parameters_at(params, context, &dates)
}

/// Resolves a built-in name to its formatted value, or `None` when the
/// name is not a built-in.
///
/// Day-granular names use the user's calendar date; `*_utc` variants and
/// instants use UTC. The legacy `*_local` aliases behave like the
/// user-local defaults.
pub fn builtin_value(name: &str, dates: &DateContext) -> Option<String> {
    let value = match name {
        "today" | "today_local" => dates.user_today().to_string(),
        "tomorrow" | "tomorrow_local" => (dates.user_today() + Duration::days(1)).to_string(),
        "yesterday" | "yesterday_local" => (dates.user_today() - Duration::days(1)).to_string(),
        "two_days_ago" => (dates.user_today() - Duration::days(2)).to_string(),
        "this_week_start" => dates.user_week_start().to_string(),
        "this_week_end" => dates.user_week_end().to_string(),
        "today_utc" => dates.utc_today().to_string(),
        "yesterday_utc" => (dates.utc_today() - Duration::days(1)).to_string(),
        "tomorrow_utc" => (dates.utc_today() + Duration::days(1)).to_string(),
        "now" => dates.instant_minus_hours(0),
        "now_minus_1h" => dates.instant_minus_hours(1),
        "now_minus_6h" => dates.instant_minus_hours(6),
        "now_minus_12h" => dates.instant_minus_hours(12),
        "now_minus_24h" => dates.instant_minus_hours(24),
        _ => return None,
    };
    Some(value)
}

/// Renders a resolved value into template output.
///
/// Strings are inserted verbatim; mappings and sequences are
/// JSON-encoded; remaining primitives use their JSON literal form.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn resolve_template_at(template: &str, context: &Value, dates: &DateContext) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let body = caps[1].trim();

            if let Some(built) = builtin_value(body, dates) {
                return built;
            }

            match resolve_path(context, body) {
                Some(value) => stringify(value),
                None => {
                    warn!("Template variable not found: {}", body);
                    MISSING_VALUE_SENTINEL.to_string()
                }
            }
        })
        .into_owned()
}

fn resolve_parameters_at(params: &Value, context: &Value, dates: &DateContext) -> Value {
    match params {
        Value::String(s) => Value::String(resolve_template_at(s, context, dates)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_parameters_at(v, context, dates)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_parameters_at(item, context, dates))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn date_context_for(context: &Value) -> DateContext {
    let timezone = resolve_path(context, "user.timezone").and_then(Value::as_str);
    DateContext::for_timezone(timezone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn dates_utc() -> DateContext {
        DateContext::at(
            Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap(),
            Some("UTC"),
        )
    }

    #[test]
    fn plain_strings_pass_through() {
        let ctx = json!({});
        assert_eq!(resolve_template("no placeholders here", &ctx), "no placeholders here");
    }

    #[test]
    fn substitutes_context_values() {
        let ctx = json!({"score": 85, "user": {"name": "Alice"}});
        assert_eq!(
            resolve_template("Hello {{user.name}}, your score is {{score}}", &ctx),
            "Hello Alice, your score is 85"
        );
    }

    #[test]
    fn missing_variables_become_sentinel() {
        let ctx = json!({});
        assert_eq!(resolve_template("{{no_such}}", &ctx), MISSING_VALUE_SENTINEL);
    }

    #[test]
    fn placeholder_bodies_are_trimmed() {
        let ctx = json!({"score": 85});
        assert_eq!(resolve_template("{{ score }}", &ctx), "85");
    }

    #[test]
    fn structured_values_are_json_encoded() {
        let ctx = json!({"emails": [{"subject": "Hi"}]});
        assert_eq!(
            resolve_template("Inbox: {{emails}}", &ctx),
            r#"Inbox: [{"subject":"Hi"}]"#
        );
    }

    #[test]
    fn null_values_render_as_null() {
        let ctx = json!({"maybe": null});
        assert_eq!(resolve_template("{{maybe}}", &ctx), "null");
    }

    #[test]
    fn today_uses_the_user_timezone() {
        // 03:30 UTC on the 12th is still the 11th in Denver.
        let utc_now = Utc.with_ymd_and_hms(2024, 6, 12, 3, 30, 0).unwrap();
        let dates = DateContext::at(utc_now, Some("America/Denver"));

        assert_eq!(builtin_value("today", &dates).unwrap(), "2024-06-11");
        assert_eq!(builtin_value("today_utc", &dates).unwrap(), "2024-06-12");
    }

    #[test]
    fn date_builtins_resolve() {
        let dates = dates_utc();
        assert_eq!(builtin_value("today", &dates).unwrap(), "2024-06-12");
        assert_eq!(builtin_value("tomorrow", &dates).unwrap(), "2024-06-13");
        assert_eq!(builtin_value("yesterday", &dates).unwrap(), "2024-06-11");
        assert_eq!(builtin_value("two_days_ago", &dates).unwrap(), "2024-06-10");
        assert_eq!(builtin_value("this_week_start", &dates).unwrap(), "2024-06-10");
        assert_eq!(builtin_value("this_week_end", &dates).unwrap(), "2024-06-16");
    }

    #[test]
    fn legacy_local_aliases_match_user_local() {
        let dates = dates_utc();
        assert_eq!(
            builtin_value("today_local", &dates),
            builtin_value("today", &dates)
        );
        assert_eq!(
            builtin_value("yesterday_local", &dates),
            builtin_value("yesterday", &dates)
        );
        assert_eq!(
            builtin_value("tomorrow_local", &dates),
            builtin_value("tomorrow", &dates)
        );
    }

    #[test]
    fn instant_builtins_use_offset_format() {
        let dates = dates_utc();
        assert_eq!(builtin_value("now", &dates).unwrap(), "2024-06-12T15:00:00Z");
        assert_eq!(
            builtin_value("now_minus_6h", &dates).unwrap(),
            "2024-06-12T09:00:00Z"
        );
        assert_eq!(
            builtin_value("now_minus_24h", &dates).unwrap(),
            "2024-06-11T15:00:00Z"
        );
    }

    #[test]
    fn unknown_builtin_is_none() {
        assert_eq!(builtin_value("next_week", &dates_utc()), None);
    }

    #[test]
    fn builtins_win_over_context_keys() {
        let ctx = json!({"today": "not-a-date"});
        let resolved = resolve_template("{{today}}", &ctx);
        assert_ne!(resolved, "not-a-date");
    }

    #[test]
    fn resolve_parameters_recurses_into_structures() {
        let ctx = json!({"name": "Alice", "score": 85});
        let params = json!({
            "message": "Hi {{name}}",
            "nested": {"value": "{{score}}"},
            "list": ["{{name}}", {"deep": "{{score}}"}, 7],
            "count": 3
        });

        let resolved = resolve_parameters(&params, &ctx);
        assert_eq!(
            resolved,
            json!({
                "message": "Hi Alice",
                "nested": {"value": "85"},
                "list": ["Alice", {"deep": "85"}, 7],
                "count": 3
            })
        );
    }

    #[test]
    fn non_string_leaves_pass_through() {
        let ctx = json!({});
        let params = json!({"n": 42, "b": true, "nothing": null});
        assert_eq!(resolve_parameters(&params, &ctx), params);
    }
}

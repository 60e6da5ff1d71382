//! Condition evaluation against the execution context.
//!
//! Evaluation never fails: unknown operators, non-numeric operands, and
//! absent paths all degrade to `false` with a logged warning, so a buggy
//! spec produces observable but recoverable behavior.

use serde_json::Value;
use tracing::warn;

use crate::domain::automation::{ComparisonOp, Condition, ConditionClause, LogicalOp};
use crate::domain::templating::{resolve_path, resolve_template, stringify};

/// Compares a (possibly absent) actual value against an expected value.
///
/// Existence operators only inspect presence. Every other operator is
/// `false` when the actual value is absent. Numeric ordering coerces both
/// sides to float; string operators compare lowercased string forms.
pub fn compare_values(actual: Option<&Value>, op: &ComparisonOp, expected: &Value) -> bool {
    match op {
        ComparisonOp::Exists => return actual.is_some(),
        ComparisonOp::NotExists => return actual.is_none(),
        _ => {}
    }

    let Some(actual) = actual else {
        return false;
    };

    if op.is_numeric() {
        let (Some(lhs), Some(rhs)) = (as_number(actual), as_number(expected)) else {
            warn!(
                "Cannot compare non-numeric values: {} {} {}",
                actual, op, expected
            );
            return false;
        };
        return match op {
            ComparisonOp::LessThan => lhs < rhs,
            ComparisonOp::GreaterThan => lhs > rhs,
            ComparisonOp::LessOrEqual => lhs <= rhs,
            ComparisonOp::GreaterOrEqual => lhs >= rhs,
            _ => false,
        };
    }

    match op {
        ComparisonOp::Equal => values_equal(actual, expected),
        ComparisonOp::NotEqual => !values_equal(actual, expected),
        ComparisonOp::Contains => lowered(actual).contains(&lowered(expected)),
        ComparisonOp::NotContains => !lowered(actual).contains(&lowered(expected)),
        ComparisonOp::StartsWith => lowered(actual).starts_with(&lowered(expected)),
        ComparisonOp::EndsWith => lowered(actual).ends_with(&lowered(expected)),
        ComparisonOp::Other(name) => {
            warn!("Unknown comparison operator: {}", name);
            false
        }
        // Handled above.
        _ => false,
    }
}

/// Evaluates a single clause against the context.
///
/// A string expected value is template-resolved first, then parsed to a
/// number when it looks numeric, so `{"value": "{{threshold}}"}` compares
/// numerically against a numeric binding.
pub fn evaluate_clause(clause: &ConditionClause, context: &Value) -> bool {
    let expected = match &clause.value {
        Some(Value::String(template)) => {
            coerce_numeric_string(resolve_template(template, context))
        }
        Some(other) => other.clone(),
        None => Value::Null,
    };

    let actual = resolve_path(context, &clause.path);
    compare_values(actual, &clause.op, &expected)
}

/// Evaluates a condition (or its absence) against the context.
///
/// An absent condition and an empty clause list are both `true`. `AND`
/// requires every clause, `OR` any; an unknown logical operator is
/// `false` with a warning.
pub fn evaluate_condition(condition: Option<&Condition>, context: &Value) -> bool {
    let Some(condition) = condition else {
        return true;
    };

    match condition {
        Condition::Clause(clause) => evaluate_clause(clause, context),
        Condition::Group(group) => {
            if group.clauses.is_empty() {
                return true;
            }
            match &group.operator {
                LogicalOp::And => group.clauses.iter().all(|c| evaluate_clause(c, context)),
                LogicalOp::Or => group.clauses.iter().any(|c| evaluate_clause(c, context)),
                LogicalOp::Other(name) => {
                    warn!("Unknown logical operator: {}", name);
                    false
                }
            }
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Value::Number(x), Value::Number(y)) = (a, b) {
        // Mixed integer/float representations compare by value.
        return match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
    }
    a == b
}

fn lowered(value: &Value) -> String {
    stringify(value).to_lowercase()
}

fn coerce_numeric_string(resolved: String) -> Value {
    if resolved.contains('.') {
        if let Ok(f) = resolved.parse::<f64>() {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return Value::Number(n);
            }
        }
    } else if let Ok(i) = resolved.parse::<i64>() {
        return Value::Number(i.into());
    }
    Value::String(resolved)
}

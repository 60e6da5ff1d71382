//! Structured conditions gating action execution.
//!
//! A condition is either a single clause (`path` / `op` / `value`) or an
//! AND/OR composition of clauses. Operators arrive as free-form strings in
//! deployed specs; unknown operators are preserved verbatim so the
//! evaluator can degrade to `false` with a warning instead of rejecting
//! the document at parse time.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Comparison operator for a single condition clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `==` (alias `eq`)
    Equal,
    /// `!=` (alias `neq`)
    NotEqual,
    /// Case-insensitive substring match.
    Contains,
    /// Negated substring match.
    NotContains,
    /// Case-insensitive prefix match.
    StartsWith,
    /// Case-insensitive suffix match.
    EndsWith,
    /// True when the path resolves to any value.
    Exists,
    /// True when the path does not resolve.
    NotExists,
    /// Unrecognized operator, preserved verbatim.
    Other(String),
}

impl ComparisonOp {
    /// Parses an operator string, preserving unknown values.
    pub fn parse(s: &str) -> Self {
        match s {
            "<" => Self::LessThan,
            ">" => Self::GreaterThan,
            "<=" => Self::LessOrEqual,
            ">=" => Self::GreaterOrEqual,
            "==" | "eq" => Self::Equal,
            "!=" | "neq" => Self::NotEqual,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "exists" => Self::Exists,
            "not_exists" => Self::NotExists,
            other => Self::Other(other.to_string()),
        }
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Other(s) => s,
        }
    }

    /// Existence operators take no comparison value.
    pub fn is_existence(&self) -> bool {
        matches!(self, Self::Exists | Self::NotExists)
    }

    /// Numeric ordering operators coerce both sides to float.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::GreaterThan | Self::LessOrEqual | Self::GreaterOrEqual
        )
    }

    /// Whether the operator is a recognized one.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for ComparisonOp {
    fn default() -> Self {
        Self::Equal
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ComparisonOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComparisonOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Logical operator joining clauses in a composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalOp {
    /// All clauses must hold.
    And,
    /// Any clause suffices.
    Or,
    /// Unrecognized operator, preserved verbatim.
    Other(String),
}

impl LogicalOp {
    /// Parses a logical operator, case-insensitively.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Self::And,
            "OR" => Self::Or,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Other(s) => s,
        }
    }

    /// Whether the operator is a recognized one.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for LogicalOp {
    fn default() -> Self {
        Self::And
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for LogicalOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogicalOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// A single comparison clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionClause {
    /// Dotted path resolved against the execution context.
    pub path: String,

    /// Comparison operator, `==` when omitted.
    #[serde(default)]
    pub op: ComparisonOp,

    /// Expected value; templates are resolved before comparison. Absent for
    /// existence operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ConditionClause {
    /// Creates a clause comparing `path` against `value` with `op`.
    pub fn new(path: impl Into<String>, op: ComparisonOp, value: Value) -> Self {
        Self {
            path: path.into(),
            op,
            value: Some(value),
        }
    }

    /// Creates an `exists` clause for a path.
    pub fn exists(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: ComparisonOp::Exists,
            value: None,
        }
    }

    /// Creates a `not_exists` clause for a path.
    pub fn not_exists(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: ComparisonOp::NotExists,
            value: None,
        }
    }

    fn structural_errors(&self, action_id: &str, errors: &mut Vec<String>) {
        if self.path.is_empty() {
            errors.push(format!("{}: condition clause has an empty 'path'", action_id));
        }
        if !self.op.is_known() {
            errors.push(format!(
                "{}: unknown condition operator '{}'",
                action_id, self.op
            ));
        }
        if self.value.is_none() && !self.op.is_existence() {
            errors.push(format!(
                "{}: condition clause with operator '{}' requires 'value'",
                action_id, self.op
            ));
        }
    }
}

/// AND/OR composition over single clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    /// Joining operator, `AND` when omitted.
    #[serde(default)]
    pub operator: LogicalOp,

    /// The clauses; an empty list evaluates to true.
    #[serde(default)]
    pub clauses: Vec<ConditionClause>,
}

/// Condition attached to an action: a clause or a composition.
///
/// Deserialization is shape-directed: a document with a `path` key is a
/// single clause, otherwise it is treated as a composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Single clause.
    Clause(ConditionClause),
    /// AND/OR composition.
    Group(ConditionGroup),
}

impl Condition {
    /// Creates a composition joining clauses with `operator`.
    pub fn group(operator: LogicalOp, clauses: Vec<ConditionClause>) -> Self {
        Self::Group(ConditionGroup { operator, clauses })
    }

    /// Collects structural problems, labelled with the owning action id.
    ///
    /// Used by the static validator: operators must be recognized and every
    /// non-existence clause needs a comparison value.
    pub fn structural_errors(&self, action_id: &str) -> Vec<String> {
        let mut errors = Vec::new();
        match self {
            Self::Clause(clause) => clause.structural_errors(action_id, &mut errors),
            Self::Group(group) => {
                if !group.operator.is_known() {
                    errors.push(format!(
                        "{}: condition operator must be 'AND' or 'OR', got '{}'",
                        action_id, group.operator
                    ));
                }
                for clause in &group.clauses {
                    clause.structural_errors(action_id, &mut errors);
                }
            }
        }
        errors
    }

    /// All clause paths referenced by this condition.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Clause(clause) => vec![clause.path.as_str()],
            Self::Group(group) => group.clauses.iter().map(|c| c.path.as_str()).collect(),
        }
    }
}

impl From<ConditionClause> for Condition {
    fn from(clause: ConditionClause) -> Self {
        Self::Clause(clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_single_clause() {
        let condition: Condition =
            serde_json::from_value(json!({"path": "score", "op": "<", "value": 70})).unwrap();

        match condition {
            Condition::Clause(clause) => {
                assert_eq!(clause.path, "score");
                assert_eq!(clause.op, ComparisonOp::LessThan);
                assert_eq!(clause.value, Some(json!(70)));
            }
            Condition::Group(_) => panic!("expected a clause"),
        }
    }

    #[test]
    fn deserializes_composition() {
        let condition: Condition = serde_json::from_value(json!({
            "operator": "OR",
            "clauses": [
                {"path": "a", "op": ">", "value": 1},
                {"path": "b", "op": "exists"}
            ]
        }))
        .unwrap();

        match condition {
            Condition::Group(group) => {
                assert_eq!(group.operator, LogicalOp::Or);
                assert_eq!(group.clauses.len(), 2);
                assert!(group.clauses[1].value.is_none());
            }
            Condition::Clause(_) => panic!("expected a composition"),
        }
    }

    #[test]
    fn op_defaults_to_equal() {
        let clause: ConditionClause =
            serde_json::from_value(json!({"path": "x", "value": 1})).unwrap();
        assert_eq!(clause.op, ComparisonOp::Equal);
    }

    #[test]
    fn eq_and_neq_aliases_parse() {
        assert_eq!(ComparisonOp::parse("eq"), ComparisonOp::Equal);
        assert_eq!(ComparisonOp::parse("neq"), ComparisonOp::NotEqual);
    }

    #[test]
    fn unknown_operator_is_preserved() {
        let op = ComparisonOp::parse("almost_equal");
        assert_eq!(op, ComparisonOp::Other("almost_equal".to_string()));
        assert!(!op.is_known());
        assert_eq!(op.as_str(), "almost_equal");
    }

    #[test]
    fn logical_op_parses_case_insensitively() {
        assert_eq!(LogicalOp::parse("and"), LogicalOp::And);
        assert_eq!(LogicalOp::parse("OR"), LogicalOp::Or);
        assert!(!LogicalOp::parse("XOR").is_known());
    }

    #[test]
    fn structural_errors_flag_missing_value() {
        let condition = Condition::Clause(ConditionClause {
            path: "score".to_string(),
            op: ComparisonOp::LessThan,
            value: None,
        });

        let errors = condition.structural_errors("action_0");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("requires 'value'"));
    }

    #[test]
    fn structural_errors_allow_existence_without_value() {
        let condition = Condition::Clause(ConditionClause::exists("score"));
        assert!(condition.structural_errors("action_0").is_empty());
    }

    #[test]
    fn structural_errors_flag_unknown_logical_operator() {
        let condition: Condition = serde_json::from_value(serde_json::json!({
            "operator": "XOR",
            "clauses": [{"path": "a", "op": "==", "value": 1}]
        }))
        .unwrap();

        let errors = condition.structural_errors("notify");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'AND' or 'OR'"));
    }

    #[test]
    fn paths_collects_all_clause_paths() {
        let condition = Condition::group(
            LogicalOp::And,
            vec![
                ConditionClause::new("a.b", ComparisonOp::Equal, json!(1)),
                ConditionClause::exists("trigger_data.subject"),
            ],
        );

        assert_eq!(condition.paths(), vec!["a.b", "trigger_data.subject"]);
    }

    #[test]
    fn serializes_back_to_original_shape() {
        let original = json!({"path": "score", "op": "<", "value": 70});
        let condition: Condition = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&condition).unwrap(), original);
    }
}

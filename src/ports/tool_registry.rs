//! Tool Registry Port - Interface for tool discovery and invocation.
//!
//! Tools are the only way an automation touches the outside world. The
//! registry resolves tool names to handlers and invokes them; the runtime
//! never knows what a tool does behind its JSON parameter schema.
//!
//! # Design
//!
//! - Handlers receive the resolved parameters as one JSON-encoded string
//! - Handlers may return free text or a structured document
//! - Handlers are async and shared (`Arc`), so registries can be cloned
//!   cheaply across concurrent executions

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::UserId;

/// What a tool handler produced: free text or structured data.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Unstructured text; the executor may extract embedded JSON from it.
    Text(String),
    /// Structured document.
    Document(Value),
}

impl From<String> for ToolOutput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ToolOutput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Value> for ToolOutput {
    fn from(v: Value) -> Self {
        Self::Document(v)
    }
}

/// Errors raised by a tool handler.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The handler rejected its parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The handler started but failed.
    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    /// Creates an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}

/// Async callable backing a tool. Receives the JSON-encoded parameters.
pub type ToolHandler =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<ToolOutput, ToolError>> + Send + Sync>;

/// A tool that can be invoked from an automation.
#[derive(Clone)]
pub struct Tool {
    /// Registry-unique name (e.g. "oura_get_daily_sleep").
    pub name: String,

    /// Human-readable description shown to automation builders.
    pub description: String,

    /// JSON-schema-like document describing accepted parameters.
    pub parameters: Value,

    /// Description of the return value.
    pub returns: String,

    /// The handler invoked with JSON-encoded parameters.
    pub handler: ToolHandler,

    /// Service this tool belongs to (e.g. "Oura", "Gmail").
    pub service: Option<String>,

    /// Additional tool metadata.
    pub metadata: Option<Value>,
}

impl Tool {
    /// Creates a tool with the given handler.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        returns: impl Into<String>,
        handler: ToolHandler,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            returns: returns.into(),
            handler,
            service: None,
            metadata: None,
        }
    }

    /// Sets the owning service.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Sets the metadata document.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Declared parameter names.
    ///
    /// Accepts both the flat `{name: {…}}` layout and JSON-schema
    /// documents with a `properties` object.
    pub fn parameter_names(&self) -> Vec<&str> {
        let map = match self.parameters.get("properties") {
            Some(Value::Object(props)) => props,
            _ => match &self.parameters {
                Value::Object(map) => map,
                _ => return Vec::new(),
            },
        };
        map.keys().map(|k| k.as_str()).collect()
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Errors from registry-level tool invocation.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No tool registered under the name.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran and failed.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Port for tool discovery and execution.
///
/// Implementations typically scope the visible tool set per user (granted
/// integrations) and are shared across concurrent executions.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Gets a tool by name.
    async fn get_tool_by_name(&self, name: &str) -> Option<Tool>;

    /// Lists tools, optionally filtered by service.
    async fn list_tools(&self, service: Option<&str>) -> Vec<Tool>;

    /// Convenience path: look up, JSON-encode the parameters, invoke.
    ///
    /// Used by the polling preflight, which needs a one-shot invocation
    /// outside the executor loop.
    async fn execute_tool(
        &self,
        name: &str,
        parameters: &Value,
        user_id: &UserId,
    ) -> Result<ToolOutput, RegistryError> {
        let tool = self
            .get_tool_by_name(name)
            .await
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))?;

        let mut payload = parameters.clone();
        if let Value::Object(map) = &mut payload {
            map.insert(
                "user_id".to_string(),
                Value::String(user_id.as_str().to_string()),
            );
        }
        let encoded = payload.to_string();

        Ok((tool.handler)(encoded).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop_handler() -> ToolHandler {
        Arc::new(|_input| Box::pin(async { Ok(ToolOutput::Document(json!({}))) }))
    }

    #[test]
    fn parameter_names_reads_flat_layout() {
        let tool = Tool::new(
            "send_email",
            "Send an email",
            json!({"to": {"type": "string"}, "body": {"type": "string"}}),
            "Delivery receipt",
            noop_handler(),
        );

        let mut names = tool.parameter_names();
        names.sort_unstable();
        assert_eq!(names, vec!["body", "to"]);
    }

    #[test]
    fn parameter_names_reads_json_schema_layout() {
        let tool = Tool::new(
            "send_email",
            "Send an email",
            json!({
                "type": "object",
                "properties": {"to": {"type": "string"}},
                "required": ["to"]
            }),
            "Delivery receipt",
            noop_handler(),
        );

        assert_eq!(tool.parameter_names(), vec!["to"]);
    }

    #[test]
    fn debug_omits_the_handler() {
        let tool = Tool::new("t", "d", json!({}), "r", noop_handler()).with_service("Gmail");
        let rendered = format!("{:?}", tool);
        assert!(rendered.contains("Gmail"));
        assert!(!rendered.contains("handler"));
    }

    #[test]
    fn tool_output_converts_from_common_types() {
        assert_eq!(ToolOutput::from("x"), ToolOutput::Text("x".to_string()));
        assert_eq!(
            ToolOutput::from(json!({"a": 1})),
            ToolOutput::Document(json!({"a": 1}))
        );
    }

    #[tokio::test]
    async fn tool_registry_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ToolRegistry>();
    }
}

//! In-memory tool registry implementation.
//!
//! This adapter provides an in-memory implementation of the `ToolRegistry`
//! port. Useful for:
//! - Development and testing environments
//! - Embedding a fixed tool set without a discovery backend
//!
//! Production deployments typically back the registry with per-user
//! integration state.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::ports::{Tool, ToolError, ToolOutput, ToolRegistry};

/// In-memory implementation of the ToolRegistry port.
///
/// Thread-safe via internal `Mutex`; tools are cheap to clone because
/// handlers are shared.
#[derive(Default)]
pub struct InMemoryToolRegistry {
    tools: Mutex<HashMap<String, Tool>>,
}

impl InMemoryToolRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any previous tool with the same name.
    pub fn register(&self, tool: Tool) {
        self.tools.lock().unwrap().insert(tool.name.clone(), tool);
    }

    /// Registers a tool from a bare async closure with an empty parameter
    /// schema.
    ///
    /// Convenience for tests and prototyping.
    pub fn register_fn<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(String) -> BoxFuture<'static, Result<ToolOutput, ToolError>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let tool = Tool::new(
            name.clone(),
            format!("Tool {}", name),
            Value::Object(serde_json::Map::new()),
            "",
            Arc::new(handler),
        );
        self.register(tool);
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.lock().unwrap().len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl ToolRegistry for InMemoryToolRegistry {
    async fn get_tool_by_name(&self, name: &str) -> Option<Tool> {
        self.tools.lock().unwrap().get(name).cloned()
    }

    async fn list_tools(&self, service: Option<&str>) -> Vec<Tool> {
        let tools = self.tools.lock().unwrap();
        let mut listed: Vec<Tool> = tools
            .values()
            .filter(|tool| match service {
                Some(service) => tool.service.as_deref() == Some(service),
                None => true,
            })
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        listed
    }
}

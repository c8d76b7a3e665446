//! `ToolsManager`: a local registry of callable [`ToolDefinition`]s,
//! looked up by name during tool-call processing.
//!
//! Grounded on the teacher's former `tool/execute_tool_call.rs`
//! lookup-and-invoke shape (find the tool by name, call its function,
//! wrap the result), generalized from the teacher's typed/dynamic tool
//! split onto the single `ToolDefinition` envelope.

use std::collections::HashMap;

use llmflow_provider::tool::ToolDefinition;
use serde_json::Value;

use crate::error::CoreError;

/// Local tools available to a caller instance, keyed by name.
#[derive(Default)]
pub struct ToolsManager {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: ToolDefinition) {
        self.tools.insert(tool.name.clone(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().cloned().collect()
    }

    /// Removes a registered tool, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<ToolDefinition> {
        self.tools.remove(name)
    }

    /// Looks up `name` and invokes its `call_function` with `arguments`,
    /// mirroring the teacher's execute-and-wrap shape.
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<Value, CoreError> {
        let tool = self.tools.get(name).ok_or_else(|| CoreError::no_such_tool(name, self.names()))?;
        (tool.call_function)(arguments).await.map_err(|message| CoreError::invalid_tool_input(name, message))
    }
}

//! Name-keyed tool dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::{FunctionDefinition, ToolCallRequest, ToolOutput};
use crate::error::Result;

/// Registered tools, looked up by the function name the model calls.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.name().to_string();
        match self.by_name.get(&name) {
            Some(&index) => self.tools[index] = tool,
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&index| &self.tools[index])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function definitions in registration order.
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.tools
            .iter()
            .map(|t| FunctionDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect()
    }

    /// Resolve one required action.
    ///
    /// Returns `Ok(None)` when no tool is registered under the function name,
    /// leaving the call to another handler. Malformed arguments and tool
    /// failures are returned as errors. `cancel` is passed on to the tool.
    pub async fn resolve(
        &self,
        call: &ToolCallRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<ToolOutput>> {
        let Some(tool) = self.get(&call.function_name) else {
            debug!(function = %call.function_name, "No tool registered; skipping call");
            return Ok(None);
        };

        let args = ToolArguments::from_json_str(&call.arguments)?;
        let ctx = ToolExecutionContext {
            tool_call_id: call.tool_call_id.clone(),
            cancel: cancel.clone(),
        };
        info!(
            tool = %call.function_name,
            tool_call_id = %call.tool_call_id,
            "Executing tool call"
        );
        let output = tool.execute(&args, &ctx).await?;

        Ok(Some(ToolOutput::new(call.tool_call_id.clone(), output)))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

//! The `Tool` seam and a closure-backed implementation of it.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::arguments::ToolArguments;
use super::types::AgentToolParameters;
use crate::error::Result;

/// Per-call state handed to a tool.
///
/// `cancel` belongs to the user request that triggered the run; long-running
/// tools should stop once it fires.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    pub tool_call_id: String,
    pub cancel: CancellationToken,
}

/// A function the hosted agent can call while a run is suspended.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name the agent uses in required actions.
    fn name(&self) -> &str;

    /// Instructions the agent reads to decide when to call the tool.
    fn description(&self) -> &str;

    fn parameters(&self) -> &AgentToolParameters;

    /// Produce the output text submitted back to the run.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String>;
}

type Handler =
    dyn Fn(ToolArguments, ToolExecutionContext) -> BoxFuture<'static, Result<String>> + Send + Sync;

/// A tool whose behaviour is an async closure.
#[derive(Clone)]
pub struct AgentTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
    handler: Arc<Handler>,
}

impl AgentTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| handler(args, ctx).boxed()),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

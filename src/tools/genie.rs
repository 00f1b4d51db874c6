//! The `AskGenie` tool: forwards a question to Genie and returns the query result.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::error::GenieError;
use crate::genie::PollingEngine;

pub const ASK_GENIE_TOOL_NAME: &str = "AskGenie";
pub const GENIE_PROMPT_PARAM: &str = "geniePrompt";

#[derive(Debug, Deserialize)]
struct AskGenieArgs {
    #[serde(rename = "geniePrompt")]
    genie_prompt: String,
}

/// Runs the full Genie workflow for the prompt the agent supplies.
#[derive(Debug, Clone)]
pub struct AskGenieTool {
    engine: PollingEngine,
    description: String,
    parameters: AgentToolParameters,
}

impl AskGenieTool {
    /// `description` is the tool instruction text shown to the model.
    pub fn new(engine: PollingEngine, description: impl Into<String>) -> Self {
        Self {
            engine,
            description: description.into(),
            parameters: AgentToolParameters::object()
                .string(GENIE_PROMPT_PARAM, "Question to be asked to Genie.", true)
                .build(),
        }
    }
}

#[async_trait]
impl Tool for AskGenieTool {
    fn name(&self) -> &str {
        ASK_GENIE_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<String, GenieError> {
        let AskGenieArgs { genie_prompt } = args.deserialize()?;
        info!(tool_call_id = %ctx.tool_call_id, "Genie starting conversation");
        let result = self
            .engine
            .run_to_completion(&genie_prompt, &ctx.cancel)
            .await?;
        info!(tool_call_id = %ctx.tool_call_id, bytes = result.len(), "Genie returned a result");
        Ok(result)
    }
}

//! One agent plus one thread, alive for the whole console session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::dispatcher::{DispatchOutcome, StreamDispatcher};
use super::observer::StreamObservers;
use super::runtime::AgentRuntime;
use super::types::{AgentDefinition, AgentHandle, ThreadHandle, ToolDefinition};
use crate::config::AgentSettings;
use crate::error::{GenieError, Result};
use crate::genie::PollingEngine;
use crate::tools::{AskGenieTool, ToolRegistry};
use crate::util::sweep::{sweep_files, SweepReport};

/// Extension of generated images removed at cleanup.
pub const IMAGE_EXTENSION: &str = "png";

/// Read an instruction text file.
pub async fn load_instructions(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        GenieError::Configuration(format!(
            "cannot read instructions {}: {e}",
            path.display()
        ))
    })
}

/// A live agent and thread, with the dispatcher that talks to them.
pub struct AgentSession {
    runtime: Arc<dyn AgentRuntime>,
    agent: AgentHandle,
    thread: ThreadHandle,
    dispatcher: StreamDispatcher,
    working_directory: PathBuf,
}

impl AgentSession {
    /// Load instructions, register `AskGenie` plus code interpreter, and create
    /// the agent and thread.
    pub async fn start(
        runtime: Arc<dyn AgentRuntime>,
        settings: &AgentSettings,
        engine: PollingEngine,
    ) -> Result<Self> {
        let agent_instructions = load_instructions(&settings.agent_instructions_file).await?;
        let tool_instructions = load_instructions(&settings.tool_instructions_file).await?;

        let tools =
            ToolRegistry::new().with_tool(Arc::new(AskGenieTool::new(engine, tool_instructions)));
        let definition = AgentDefinition::builder()
            .model(settings.model.clone())
            .name(settings.name.clone())
            .instructions(agent_instructions)
            .tools(agent_tools(&tools))
            .build();

        Self::create(runtime, &definition, tools, settings.working_directory.clone()).await
    }

    /// Create the agent and thread for an already-assembled definition.
    pub async fn create(
        runtime: Arc<dyn AgentRuntime>,
        definition: &AgentDefinition,
        tools: ToolRegistry,
        working_directory: PathBuf,
    ) -> Result<Self> {
        let agent = runtime.create_agent(definition).await?;
        info!(agent_id = %agent.id, name = %definition.name, "Agent created");
        let thread = runtime.create_thread().await?;
        info!(thread_id = %thread.id, "Thread created");

        let dispatcher = StreamDispatcher::new(runtime.clone(), tools, working_directory.clone());
        Ok(Self {
            runtime,
            agent,
            thread,
            dispatcher,
            working_directory,
        })
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }

    pub fn thread(&self) -> &ThreadHandle {
        &self.thread
    }

    pub fn observers_mut(&mut self) -> &mut StreamObservers {
        self.dispatcher.observers_mut()
    }

    /// Send one user prompt and wait for the run, tool calls included, to settle.
    pub async fn send(&self, prompt: &str, cancel: &CancellationToken) -> Result<DispatchOutcome> {
        self.dispatcher
            .send_message(&self.thread, &self.agent, prompt, cancel)
            .await
    }

    /// Delete the thread and agent, then sweep generated images.
    ///
    /// Deletion failures propagate; image removal is best-effort and reported.
    pub async fn cleanup(self) -> Result<SweepReport> {
        self.runtime.delete_thread(&self.thread).await?;
        info!(thread_id = %self.thread.id, "Thread deleted");
        self.runtime.delete_agent(&self.agent).await?;
        info!(agent_id = %self.agent.id, "Agent deleted");

        Ok(sweep_files(&self.working_directory, IMAGE_EXTENSION).await)
    }
}

/// Registered functions followed by the code interpreter.
pub fn agent_tools(tools: &ToolRegistry) -> Vec<ToolDefinition> {
    tools
        .definitions()
        .into_iter()
        .map(ToolDefinition::Function)
        .chain(std::iter::once(ToolDefinition::CodeInterpreter))
        .collect()
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("agent", &self.agent)
            .field("thread", &self.thread)
            .field("working_directory", &self.working_directory)
            .finish()
    }
}

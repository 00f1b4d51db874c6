//! The hosted agent service as seen by the dispatcher and session.

use async_trait::async_trait;

use super::types::{
    AgentDefinition, AgentHandle, FileInfo, RunEventStream, RunHandle, ThreadHandle,
};
use crate::error::Result;
use crate::tools::ToolOutput;

/// Operations a hosted agent service must provide.
///
/// Streams returned by [`stream_run`](Self::stream_run) and
/// [`submit_tool_outputs`](Self::submit_tool_outputs) end when the service
/// closes the current run segment: either the run completed or it is
/// suspended waiting for tool outputs.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<AgentHandle>;

    async fn create_thread(&self) -> Result<ThreadHandle>;

    /// Post a user message to the thread.
    async fn post_message(&self, thread: &ThreadHandle, content: &str) -> Result<()>;

    /// Start a run of `agent` on `thread` and stream its updates.
    async fn stream_run(&self, thread: &ThreadHandle, agent: &AgentHandle)
        -> Result<RunEventStream>;

    /// Resume a suspended run; the returned stream continues the run.
    async fn submit_tool_outputs(
        &self,
        run: &RunHandle,
        outputs: &[ToolOutput],
    ) -> Result<RunEventStream>;

    async fn file_info(&self, file_id: &str) -> Result<FileInfo>;

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>>;

    async fn delete_agent(&self, agent: &AgentHandle) -> Result<()>;

    async fn delete_thread(&self, thread: &ThreadHandle) -> Result<()>;
}

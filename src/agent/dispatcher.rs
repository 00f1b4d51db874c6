//! Consumes agent run streams, resolving tool calls until the run settles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::observer::StreamObservers;
use super::runtime::AgentRuntime;
use super::types::{AgentHandle, RunEvent, RunEventStream, RunHandle, RunLifecycle, ThreadHandle};
use crate::error::{GenieError, Result};
use crate::tools::{ToolOutput, ToolRegistry};

/// Where the dispatcher is within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Consuming an update sequence.
    Streaming,
    /// The sequence ended with tool outputs waiting to be submitted.
    AwaitingToolOutputs,
    /// A sequence ended without required actions.
    Completed,
}

/// Summary of one user message handled end to end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// All assistant text, concatenated in arrival order.
    pub transcript: String,
    /// Update sequences consumed (1 + number of submissions).
    pub passes: u32,
    /// Every tool output submitted, in submission order.
    pub tool_outputs: Vec<ToolOutput>,
    /// Local paths of downloaded images.
    pub images: Vec<PathBuf>,
}

/// State gathered while consuming one update sequence.
#[derive(Default)]
struct Pass {
    pending: Vec<ToolOutput>,
    run: Option<RunHandle>,
}

/// Drives a run: stream → resolve tool calls → submit → stream again.
pub struct StreamDispatcher {
    runtime: Arc<dyn AgentRuntime>,
    tools: ToolRegistry,
    observers: StreamObservers,
    image_dir: PathBuf,
}

impl StreamDispatcher {
    pub fn new(
        runtime: Arc<dyn AgentRuntime>,
        tools: ToolRegistry,
        image_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            tools,
            observers: StreamObservers::new(),
            image_dir: image_dir.into(),
        }
    }

    pub fn observers_mut(&mut self) -> &mut StreamObservers {
        &mut self.observers
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Post `prompt` to the thread and follow the run until it settles.
    ///
    /// Each update sequence is consumed to exhaustion before any tool output
    /// is submitted. The run is done once a sequence yields no tool outputs.
    /// Firing `cancel` stops consumption and any tool still running with
    /// [`GenieError::Canceled`].
    pub async fn send_message(
        &self,
        thread: &ThreadHandle,
        agent: &AgentHandle,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome> {
        self.runtime.post_message(thread, prompt).await?;
        let mut stream = self.runtime.stream_run(thread, agent).await?;
        let mut outcome = DispatchOutcome::default();
        let mut state = DispatchState::Streaming;

        loop {
            debug!(?state, pass = outcome.passes + 1, "Consuming run updates");
            let pass = self.consume(stream, &mut outcome, cancel).await?;
            outcome.passes += 1;

            if pass.pending.is_empty() {
                state = DispatchState::Completed;
                debug!(?state, passes = outcome.passes, "Run settled");
                return Ok(outcome);
            }

            state = DispatchState::AwaitingToolOutputs;
            let run = pass.run.ok_or_else(|| {
                GenieError::InvalidState("tool outputs pending without a run handle".into())
            })?;
            debug!(?state, run_id = %run.id, outputs = pass.pending.len(), "Submitting tool outputs");
            stream = self
                .runtime
                .submit_tool_outputs(&run, &pass.pending)
                .await?;
            outcome.tool_outputs.extend(pass.pending);
            state = DispatchState::Streaming;
        }
    }

    async fn consume(
        &self,
        mut stream: RunEventStream,
        outcome: &mut DispatchOutcome,
        cancel: &CancellationToken,
    ) -> Result<Pass> {
        let mut pass = Pass::default();

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenieError::Canceled),
                event = stream.next() => event,
            };
            let Some(event) = event else { break };

            match event? {
                RunEvent::RequiredAction { run, call } => {
                    info!(
                        tool_call_id = %call.tool_call_id,
                        function = %call.function_name,
                        "Run requires action"
                    );
                    match self.tools.resolve(&call, cancel).await? {
                        Some(output) => pass.pending.push(output),
                        None => warn!(
                            function = %call.function_name,
                            "No handler for required action; run may stay suspended"
                        ),
                    }
                    pass.run = Some(run);
                }
                RunEvent::ContentDelta {
                    text,
                    image_file_id,
                } => {
                    if let Some(file_id) = image_file_id {
                        let path = self.download_image(&file_id).await?;
                        self.observers.notify_image(&path);
                        outcome.images.push(path);
                    }
                    outcome.transcript.push_str(&text);
                    self.observers.notify_text(&text);
                }
                RunEvent::Lifecycle(RunLifecycle::Created) => debug!("Run started"),
                RunEvent::Lifecycle(RunLifecycle::Completed) => debug!("Run completed"),
                RunEvent::Lifecycle(RunLifecycle::Failed { message }) => {
                    return Err(GenieError::Runtime(format!("run failed: {message}")));
                }
            }
        }

        Ok(pass)
    }

    /// Fetch a generated file and write it under the image directory.
    async fn download_image(&self, file_id: &str) -> Result<PathBuf> {
        let info = self.runtime.file_info(file_id).await?;
        let bytes = self.runtime.file_content(file_id).await?;

        let path = self.image_dir.join(local_file_name(&info.filename, file_id));
        tokio::fs::create_dir_all(&self.image_dir).await?;
        tokio::fs::write(&path, &bytes).await?;
        info!(file_id, path = %path.display(), bytes = bytes.len(), "Saved generated image");
        Ok(path)
    }
}

impl std::fmt::Debug for StreamDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDispatcher")
            .field("tools", &self.tools)
            .field("observers", &self.observers)
            .field("image_dir", &self.image_dir)
            .finish()
    }
}

/// Final path component of the reported name; falls back to `<file_id>.png`.
fn local_file_name(reported: &str, file_id: &str) -> PathBuf {
    Path::new(reported)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{file_id}.png")))
}

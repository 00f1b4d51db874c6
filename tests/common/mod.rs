//! Shared test helpers: scripted Genie API and agent runtime.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use genie_console::agent::{
    AgentDefinition, AgentHandle, AgentRuntime, FileInfo, RunEvent, RunEventStream, RunHandle,
    ThreadHandle,
};
use genie_console::error::{GenieError, Result};
use genie_console::genie::{
    ConversationApi, MessageSnapshot, PollPolicy, PollingEngine, StartedConversation,
};
use genie_console::tools::{ToolCallRequest, ToolOutput};

/// Genie API that replays a fixed status sequence.
pub struct ScriptedGenie {
    statuses: Mutex<VecDeque<MessageSnapshot>>,
    result: String,
    pub prompts: Mutex<Vec<String>>,
    pub status_calls: Mutex<u32>,
    pub result_calls: Mutex<Vec<String>>,
}

impl ScriptedGenie {
    /// `statuses` are returned in order; the last one repeats.
    pub fn new(statuses: &[&str], result: &str) -> Self {
        let statuses = statuses
            .iter()
            .map(|s| MessageSnapshot {
                status: s.to_string(),
                attachment_id: if *s == "COMPLETED" {
                    "att-1".into()
                } else {
                    String::new()
                },
                ..Default::default()
            })
            .collect();
        Self {
            statuses: Mutex::new(statuses),
            result: result.to_string(),
            prompts: Mutex::new(Vec::new()),
            status_calls: Mutex::new(0),
            result_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn status_calls(&self) -> u32 {
        *self.status_calls.lock().unwrap()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationApi for ScriptedGenie {
    async fn start_conversation(&self, prompt: &str) -> Result<StartedConversation> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(StartedConversation {
            message_id: "msg-1".into(),
            conversation_id: "conv-1".into(),
        })
    }

    async fn message_status(&self, _: &str, _: &str) -> Result<MessageSnapshot> {
        *self.status_calls.lock().unwrap() += 1;
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        next.ok_or_else(|| GenieError::InvalidState("no scripted status".into()))
    }

    async fn query_result(&self, _: &str, _: &str, attachment_id: &str) -> Result<String> {
        self.result_calls
            .lock()
            .unwrap()
            .push(attachment_id.to_string());
        Ok(self.result.clone())
    }
}

/// Polling engine over `api` with no delay between checks.
pub fn instant_engine(api: Arc<dyn ConversationApi>) -> PollingEngine {
    PollingEngine::new(
        api,
        PollPolicy::builder()
            .interval(Duration::ZERO)
            .max_attempts(20)
            .build(),
    )
}

/// One call recorded by [`MockAgentRuntime`].
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    CreateAgent(AgentDefinition),
    CreateThread,
    PostMessage { thread_id: String, content: String },
    StreamRun { thread_id: String, agent_id: String },
    SubmitToolOutputs { run: RunHandle, outputs: Vec<ToolOutput> },
    FileInfo(String),
    FileContent(String),
    DeleteAgent(String),
    DeleteThread(String),
}

/// Agent runtime that serves queued event sequences and records every call.
#[derive(Default)]
pub struct MockAgentRuntime {
    streams: Mutex<VecDeque<Vec<Result<RunEvent>>>>,
    files: Mutex<HashMap<String, (String, Vec<u8>)>>,
    calls: Mutex<Vec<RuntimeCall>>,
    fail_delete_thread: Mutex<bool>,
}

impl MockAgentRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the event sequence returned by the next run or submission.
    pub fn queue_stream(&self, events: Vec<RunEvent>) {
        self.streams
            .lock()
            .unwrap()
            .push_back(events.into_iter().map(Ok).collect());
    }

    pub fn queue_failing_stream(&self, events: Vec<Result<RunEvent>>) {
        self.streams.lock().unwrap().push_back(events);
    }

    pub fn add_file(&self, file_id: &str, filename: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), (filename.to_string(), bytes.to_vec()));
    }

    pub fn fail_thread_deletion(&self) {
        *self.fail_delete_thread.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<(RunHandle, Vec<ToolOutput>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RuntimeCall::SubmitToolOutputs { run, outputs } => Some((run, outputs)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RuntimeCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_stream(&self) -> Result<RunEventStream> {
        let events = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenieError::InvalidState("no scripted stream".into()))?;
        Ok(futures::stream::iter(events).boxed())
    }

    fn file(&self, file_id: &str) -> Result<(String, Vec<u8>)> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| GenieError::protocol(404, format!("no file {file_id}")))
    }
}

#[async_trait]
impl AgentRuntime for MockAgentRuntime {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<AgentHandle> {
        self.record(RuntimeCall::CreateAgent(definition.clone()));
        Ok(AgentHandle {
            id: "asst_1".into(),
        })
    }

    async fn create_thread(&self) -> Result<ThreadHandle> {
        self.record(RuntimeCall::CreateThread);
        Ok(ThreadHandle {
            id: "thread_1".into(),
        })
    }

    async fn post_message(&self, thread: &ThreadHandle, content: &str) -> Result<()> {
        self.record(RuntimeCall::PostMessage {
            thread_id: thread.id.clone(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn stream_run(
        &self,
        thread: &ThreadHandle,
        agent: &AgentHandle,
    ) -> Result<RunEventStream> {
        self.record(RuntimeCall::StreamRun {
            thread_id: thread.id.clone(),
            agent_id: agent.id.clone(),
        });
        self.next_stream()
    }

    async fn submit_tool_outputs(
        &self,
        run: &RunHandle,
        outputs: &[ToolOutput],
    ) -> Result<RunEventStream> {
        self.record(RuntimeCall::SubmitToolOutputs {
            run: run.clone(),
            outputs: outputs.to_vec(),
        });
        self.next_stream()
    }

    async fn file_info(&self, file_id: &str) -> Result<FileInfo> {
        self.record(RuntimeCall::FileInfo(file_id.to_string()));
        let (filename, _) = self.file(file_id)?;
        Ok(FileInfo {
            id: file_id.to_string(),
            filename,
        })
    }

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>> {
        self.record(RuntimeCall::FileContent(file_id.to_string()));
        Ok(self.file(file_id)?.1)
    }

    async fn delete_agent(&self, agent: &AgentHandle) -> Result<()> {
        self.record(RuntimeCall::DeleteAgent(agent.id.clone()));
        Ok(())
    }

    async fn delete_thread(&self, thread: &ThreadHandle) -> Result<()> {
        self.record(RuntimeCall::DeleteThread(thread.id.clone()));
        if *self.fail_delete_thread.lock().unwrap() {
            return Err(GenieError::protocol(500, "thread deletion failed"));
        }
        Ok(())
    }
}

pub fn run_handle() -> RunHandle {
    RunHandle {
        id: "run_1".into(),
        thread_id: "thread_1".into(),
    }
}

/// A required action for `function` with raw JSON `arguments`.
pub fn required_action(call_id: &str, function: &str, arguments: &str) -> RunEvent {
    RunEvent::RequiredAction {
        run: run_handle(),
        call: ToolCallRequest {
            tool_call_id: call_id.to_string(),
            function_name: function.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

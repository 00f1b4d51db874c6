//! Hosted agent service over its assistants-style REST API.
//!
//! Runs are streamed as server-sent events and mapped onto [`RunEvent`]s.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use super::runtime::AgentRuntime;
use super::types::{
    AgentDefinition, AgentHandle, FileInfo, RunEvent, RunEventStream, RunHandle, RunLifecycle,
    ThreadHandle, ToolDefinition,
};
use crate::config::AgentSettings;
use crate::error::{GenieError, Result};
use crate::tools::{ToolCallRequest, ToolOutput};
use crate::util::http::{
    bearer_headers, ensure_success, parse_sse_line, shared_client, trim_trailing_slash, SseLine,
};

/// Parts of a project connection string (`host;subscription;resourceGroup;project`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConnection {
    pub host: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub project_name: String,
}

impl ProjectConnection {
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(';').map(str::trim).collect();
        match parts.as_slice() {
            [host, subscription, group, project]
                if [host, subscription, group, project].iter().all(|p| !p.is_empty()) =>
            {
                Ok(Self {
                    host: host.to_string(),
                    subscription_id: subscription.to_string(),
                    resource_group: group.to_string(),
                    project_name: project.to_string(),
                })
            }
            _ => Err(GenieError::Configuration(
                "PROJECT_CONNECTION_STRING must be host;subscriptionId;resourceGroup;projectName"
                    .into(),
            )),
        }
    }

    /// Base URL of the project's agents endpoint. Hosts without a scheme use https.
    pub fn endpoint(&self) -> String {
        let host = trim_trailing_slash(&self.host);
        let origin = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        format!(
            "{origin}/agents/v1.0/subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
            self.subscription_id, self.resource_group, self.project_name
        )
    }
}

/// [`AgentRuntime`] backed by the hosted agent REST API.
#[derive(Debug, Clone)]
pub struct AssistantsRuntime {
    base_url: String,
    api_version: String,
    headers: HeaderMap,
}

impl AssistantsRuntime {
    pub fn new(
        base_url: impl Into<String>,
        api_key: &str,
        api_version: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        Ok(Self {
            base_url: trim_trailing_slash(&base_url).to_string(),
            api_version: api_version.into(),
            headers: bearer_headers(api_key)?,
        })
    }

    pub fn from_settings(settings: &AgentSettings) -> Result<Self> {
        let connection = ProjectConnection::parse(&settings.connection_string)?;
        Self::new(
            connection.endpoint(),
            &settings.api_key,
            settings.api_version.clone(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}?api-version={}", self.base_url, self.api_version)
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        debug!(path, "Agent service POST");
        let resp = shared_client()
            .post(self.url(path))
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;
        ensure_success(resp).await
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        debug!(path, "Agent service GET");
        let resp = shared_client()
            .get(self.url(path))
            .headers(self.headers.clone())
            .send()
            .await?;
        ensure_success(resp).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        debug!(path, "Agent service DELETE");
        let resp = shared_client()
            .delete(self.url(path))
            .headers(self.headers.clone())
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn open_stream(&self, path: &str, body: serde_json::Value) -> Result<RunEventStream> {
        let resp = self.post_json(path, &body).await?;
        Ok(run_event_stream(resp.bytes_stream()))
    }
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[async_trait]
impl AgentRuntime for AssistantsRuntime {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<AgentHandle> {
        let tools: Vec<serde_json::Value> = definition.tools.iter().map(tool_to_json).collect();
        let body = serde_json::json!({
            "model": definition.model,
            "name": definition.name,
            "instructions": definition.instructions,
            "tools": tools,
        });
        let created: IdResponse = self.post_json("assistants", &body).await?.json().await?;
        Ok(AgentHandle { id: created.id })
    }

    async fn create_thread(&self) -> Result<ThreadHandle> {
        let created: IdResponse = self
            .post_json("threads", &serde_json::json!({}))
            .await?
            .json()
            .await?;
        Ok(ThreadHandle { id: created.id })
    }

    async fn post_message(&self, thread: &ThreadHandle, content: &str) -> Result<()> {
        let body = serde_json::json!({ "role": "user", "content": content });
        self.post_json(&format!("threads/{}/messages", thread.id), &body)
            .await?;
        Ok(())
    }

    async fn stream_run(
        &self,
        thread: &ThreadHandle,
        agent: &AgentHandle,
    ) -> Result<RunEventStream> {
        let body = serde_json::json!({ "assistant_id": agent.id, "stream": true });
        self.open_stream(&format!("threads/{}/runs", thread.id), body)
            .await
    }

    async fn submit_tool_outputs(
        &self,
        run: &RunHandle,
        outputs: &[ToolOutput],
    ) -> Result<RunEventStream> {
        let tool_outputs: Vec<serde_json::Value> = outputs
            .iter()
            .map(|o| serde_json::json!({ "tool_call_id": o.tool_call_id, "output": o.output }))
            .collect();
        let body = serde_json::json!({ "tool_outputs": tool_outputs, "stream": true });
        self.open_stream(
            &format!("threads/{}/runs/{}/submit_tool_outputs", run.thread_id, run.id),
            body,
        )
        .await
    }

    async fn file_info(&self, file_id: &str) -> Result<FileInfo> {
        Ok(self.get(&format!("files/{file_id}")).await?.json().await?)
    }

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(&format!("files/{file_id}/content"))
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    async fn delete_agent(&self, agent: &AgentHandle) -> Result<()> {
        self.delete(&format!("assistants/{}", agent.id)).await
    }

    async fn delete_thread(&self, thread: &ThreadHandle) -> Result<()> {
        self.delete(&format!("threads/{}", thread.id)).await
    }
}

fn tool_to_json(tool: &ToolDefinition) -> serde_json::Value {
    match tool {
        ToolDefinition::Function(f) => serde_json::json!({
            "type": "function",
            "function": {
                "name": f.name,
                "description": f.description,
                "parameters": f.parameters,
            }
        }),
        ToolDefinition::CodeInterpreter => serde_json::json!({ "type": "code_interpreter" }),
    }
}

/// Turn an SSE byte stream into run events. Ends at the `done` event or EOF.
pub fn run_event_stream<S, B, E>(byte_stream: S) -> RunEventStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<GenieError> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();
        let mut event_name = String::new();
        futures::pin_mut!(byte_stream);

        'outer: while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(e.into());
                    break;
                }
            };

            // Bytes are kept until a full line arrives; chunks may split a UTF-8 sequence.
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                let line = match std::str::from_utf8(&raw) {
                    Ok(line) => line.trim().to_string(),
                    Err(e) => {
                        yield Err(GenieError::Parse(format!("SSE line is not valid UTF-8: {e}")));
                        break 'outer;
                    }
                };

                if line.is_empty() {
                    event_name.clear();
                    continue;
                }

                match parse_sse_line(&line) {
                    Some(SseLine::Event(name)) => event_name = name.to_string(),
                    Some(SseLine::Data(data)) => {
                        if event_name == "done" || data == "[DONE]" {
                            break 'outer;
                        }
                        match map_event(&event_name, data) {
                            Ok(events) => {
                                for event in events {
                                    yield Ok(event);
                                }
                            }
                            Err(e) => {
                                yield Err(e);
                                break 'outer;
                            }
                        }
                    }
                    None => {}
                }
            }
        }
    };

    Box::pin(stream)
}

#[derive(Debug, Deserialize)]
struct RunPayload {
    id: String,
    thread_id: String,
    #[serde(default)]
    required_action: Option<RequiredActionPayload>,
    #[serde(default)]
    last_error: Option<RunErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct RequiredActionPayload {
    submit_tool_outputs: SubmitToolOutputsPayload,
}

#[derive(Debug, Deserialize)]
struct SubmitToolOutputsPayload {
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    id: String,
    #[serde(default)]
    function: Option<FunctionCallPayload>,
}

#[derive(Debug, Deserialize)]
struct FunctionCallPayload {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct RunErrorPayload {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaPayload {
    delta: MessageDeltaBody,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    #[serde(default)]
    content: Vec<DeltaContentPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DeltaContentPayload {
    Text { text: TextDeltaPayload },
    ImageFile { image_file: ImageFilePayload },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextDeltaPayload {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ImageFilePayload {
    file_id: String,
}

/// Map one SSE event to zero or more run events. Unknown events are ignored.
fn map_event(event: &str, data: &str) -> Result<Vec<RunEvent>> {
    let events = match event {
        "thread.run.created" => vec![RunEvent::Lifecycle(RunLifecycle::Created)],
        "thread.run.completed" => vec![RunEvent::Lifecycle(RunLifecycle::Completed)],
        "thread.run.failed" | "thread.run.cancelled" | "thread.run.expired" => {
            let run: RunPayload = serde_json::from_str(data)?;
            let message = run
                .last_error
                .and_then(|e| e.message.or(e.code))
                .unwrap_or_else(|| event.trim_start_matches("thread.run.").to_string());
            vec![RunEvent::Lifecycle(RunLifecycle::Failed { message })]
        }
        "thread.run.requires_action" => {
            let run: RunPayload = serde_json::from_str(data)?;
            let handle = RunHandle {
                id: run.id,
                thread_id: run.thread_id,
            };
            let calls = run
                .required_action
                .map(|a| a.submit_tool_outputs.tool_calls)
                .unwrap_or_default();
            calls
                .into_iter()
                .filter_map(|call| {
                    let function = call.function?;
                    Some(RunEvent::RequiredAction {
                        run: handle.clone(),
                        call: ToolCallRequest {
                            tool_call_id: call.id,
                            function_name: function.name,
                            arguments: function.arguments,
                        },
                    })
                })
                .collect()
        }
        "thread.message.delta" => {
            let delta: MessageDeltaPayload = serde_json::from_str(data)?;
            delta
                .delta
                .content
                .into_iter()
                .filter_map(|part| match part {
                    DeltaContentPayload::Text { text } => Some(RunEvent::text(text.value)),
                    DeltaContentPayload::ImageFile { image_file } => {
                        Some(RunEvent::image(image_file.file_id))
                    }
                    DeltaContentPayload::Other => None,
                })
                .collect()
        }
        _ => Vec::new(),
    };
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn connection_string_builds_project_endpoint() {
        let conn = ProjectConnection::parse("eastus.api.azureml.ms;sub-1;rg-1;proj-1").unwrap();
        assert_eq!(
            conn.endpoint(),
            "https://eastus.api.azureml.ms/agents/v1.0/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.MachineLearningServices/workspaces/proj-1"
        );
    }

    #[test]
    fn connection_string_keeps_explicit_scheme() {
        let conn = ProjectConnection::parse("http://127.0.0.1:9000;s;r;p").unwrap();
        assert!(conn.endpoint().starts_with("http://127.0.0.1:9000/agents/v1.0/"));
    }

    #[test]
    fn malformed_connection_string_is_configuration_error() {
        for raw in ["", "host;sub;rg", "host;;rg;proj", "a;b;c;d;e"] {
            let err = ProjectConnection::parse(raw).unwrap_err();
            assert!(matches!(err, GenieError::Configuration(_)), "{raw}");
        }
    }

    #[test]
    fn requires_action_yields_one_event_per_function_call() {
        let data = serde_json::json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [
                        {"id": "call_a", "type": "function", "function": {"name": "AskGenie", "arguments": "{\"geniePrompt\":\"x\"}"}},
                        {"id": "call_b", "type": "function", "function": {"name": "AskGenie", "arguments": "{}"}}
                    ]
                }
            }
        })
        .to_string();

        let events = map_event("thread.run.requires_action", &data).unwrap();

        let run = RunHandle {
            id: "run_1".into(),
            thread_id: "thread_1".into(),
        };
        assert_eq!(
            events,
            vec![
                RunEvent::RequiredAction {
                    run: run.clone(),
                    call: ToolCallRequest {
                        tool_call_id: "call_a".into(),
                        function_name: "AskGenie".into(),
                        arguments: "{\"geniePrompt\":\"x\"}".into(),
                    },
                },
                RunEvent::RequiredAction {
                    run,
                    call: ToolCallRequest {
                        tool_call_id: "call_b".into(),
                        function_name: "AskGenie".into(),
                        arguments: "{}".into(),
                    },
                },
            ]
        );
    }

    #[test]
    fn message_delta_maps_text_and_images() {
        let data = serde_json::json!({
            "id": "msg_1",
            "object": "thread.message.delta",
            "delta": {"content": [
                {"index": 0, "type": "text", "text": {"value": "Here is the chart"}},
                {"index": 1, "type": "image_file", "image_file": {"file_id": "file_9"}},
                {"index": 2, "type": "something_new"}
            ]}
        })
        .to_string();

        let events = map_event("thread.message.delta", &data).unwrap();

        assert_eq!(
            events,
            vec![RunEvent::text("Here is the chart"), RunEvent::image("file_9")]
        );
    }

    #[test]
    fn failed_run_carries_service_message() {
        let data = r#"{"id":"run_1","thread_id":"t","last_error":{"code":"server_error","message":"boom"}}"#;
        let events = map_event("thread.run.failed", data).unwrap();
        assert_eq!(
            events,
            vec![RunEvent::Lifecycle(RunLifecycle::Failed {
                message: "boom".into()
            })]
        );
    }

    #[test]
    fn unknown_events_are_ignored() {
        assert!(map_event("thread.run.step.delta", "{}").unwrap().is_empty());
    }

    fn chunks(parts: &[&str]) -> Vec<std::result::Result<Vec<u8>, GenieError>> {
        parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect()
    }

    #[tokio::test]
    async fn sse_stream_handles_split_chunks_and_done() {
        let body = chunks(&[
            "event: thread.run.created\ndata: {\"id\":\"run_1\"}\n\n",
            "event: thread.message.delta\ndata: {\"delta\":{\"content\":[{\"type\":\"text\",\"te",
            "xt\":{\"value\":\"Hi\"}}]}}\n\n",
            "event: thread.run.completed\ndata: {\"id\":\"run_1\"}\n\n",
            "event: done\ndata: [DONE]\n\n",
            "event: thread.message.delta\ndata: {\"delta\":{\"content\":[]}}\n\n",
        ]);

        let events: Vec<RunEvent> = run_event_stream(futures::stream::iter(body))
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                RunEvent::Lifecycle(RunLifecycle::Created),
                RunEvent::text("Hi"),
                RunEvent::Lifecycle(RunLifecycle::Completed),
            ]
        );
    }

    #[tokio::test]
    async fn multibyte_characters_split_across_chunks_survive() {
        let frame = "event: thread.message.delta\ndata: {\"delta\":{\"content\":[{\"type\":\"text\",\"text\":{\"value\":\"Umsatz: 5 \u{20ac}\"}}]}}\n\n";
        let bytes = frame.as_bytes();
        let split = frame.find('\u{20ac}').unwrap() + 1;
        let body: Vec<std::result::Result<Vec<u8>, GenieError>> =
            vec![Ok(bytes[..split].to_vec()), Ok(bytes[split..].to_vec())];

        let events: Vec<RunEvent> = run_event_stream(futures::stream::iter(body))
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(events, vec![RunEvent::text("Umsatz: 5 \u{20ac}")]);
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_parse_error() {
        let body: Vec<std::result::Result<Vec<u8>, GenieError>> =
            vec![Ok(b"event: thread.run.created\ndata: \xff\xfe\n\n".to_vec())];

        let events: Vec<Result<RunEvent>> =
            run_event_stream(futures::stream::iter(body)).collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(GenieError::Parse(_))));
    }

    #[tokio::test]
    async fn malformed_known_event_surfaces_error() {
        let body = chunks(&["event: thread.run.requires_action\ndata: {not json}\n\n"]);

        let events: Vec<Result<RunEvent>> =
            run_event_stream(futures::stream::iter(body)).collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(GenieError::Serialization(_))));
    }
}

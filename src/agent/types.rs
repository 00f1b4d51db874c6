//! Hosted agent handles, definitions and run events.

use bon::Builder;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::GenieError;
use crate::tools::{FunctionDefinition, ToolCallRequest};

/// A live agent on the hosted service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentHandle {
    pub id: String,
}

/// A live conversation thread on the hosted service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadHandle {
    pub id: String,
}

/// A run suspended on required actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    pub id: String,
    pub thread_id: String,
}

/// Metadata of a file produced by the agent (e.g. a generated chart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    pub filename: String,
}

/// Tool made available to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolDefinition {
    Function(FunctionDefinition),
    CodeInterpreter,
}

/// Everything needed to create an agent.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct AgentDefinition {
    #[builder(into)]
    pub model: String,
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub instructions: String,
    #[builder(default)]
    pub tools: Vec<ToolDefinition>,
}

/// Run lifecycle markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunLifecycle {
    Created,
    Completed,
    /// Failed, cancelled or expired on the service side.
    Failed { message: String },
}

/// One update from a streaming run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The run is suspended until `call` has an output.
    RequiredAction { run: RunHandle, call: ToolCallRequest },
    /// Assistant output. `text` may be empty when only an image arrived.
    ContentDelta {
        text: String,
        image_file_id: Option<String>,
    },
    Lifecycle(RunLifecycle),
}

impl RunEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::ContentDelta {
            text: text.into(),
            image_file_id: None,
        }
    }

    pub fn image(file_id: impl Into<String>) -> Self {
        Self::ContentDelta {
            text: String::new(),
            image_file_id: Some(file_id.into()),
        }
    }
}

/// Ordered update sequence of one run segment.
pub type RunEventStream = BoxStream<'static, Result<RunEvent, GenieError>>;

//! Convenience re-exports for common use.

pub use crate::agent::{AgentRuntime, AgentSession, AssistantsRuntime, StreamDispatcher};
pub use crate::config::{AgentSettings, AppConfig, GenieSettings};
pub use crate::error::{GenieError, Result};
pub use crate::genie::{ConversationApi, ConversationClient, PollPolicy, PollingEngine};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolRegistry};

//! Tool system for function calling.

pub mod arguments;
pub mod genie;
pub mod registry;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use genie::{AskGenieTool, ASK_GENIE_TOOL_NAME, GENIE_PROMPT_PARAM};
pub use registry::ToolRegistry;
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::{AgentToolParameters, FunctionDefinition, ToolCallRequest, ToolOutput};

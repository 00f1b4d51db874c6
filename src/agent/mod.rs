//! Hosted agent integration: runtime seam, stream dispatch and session lifecycle.

pub mod assistants;
pub mod dispatcher;
pub mod observer;
pub mod runtime;
pub mod session;
pub mod types;

pub use assistants::{AssistantsRuntime, ProjectConnection};
pub use dispatcher::{DispatchOutcome, DispatchState, StreamDispatcher};
pub use observer::{ImageObserver, StreamObservers, TextObserver};
pub use runtime::AgentRuntime;
pub use session::{agent_tools, load_instructions, AgentSession, IMAGE_EXTENSION};
pub use types::{
    AgentDefinition, AgentHandle, FileInfo, RunEvent, RunEventStream, RunHandle, RunLifecycle,
    ThreadHandle, ToolDefinition,
};

//! Genie conversational-analytics API: client, status vocabulary and poller.

pub mod client;
pub mod poller;
pub mod status;
pub mod types;

pub use client::{ConversationApi, ConversationClient};
pub use poller::{PollOutcome, PollPolicy, PollingEngine, DEFAULT_POLL_INTERVAL};
pub use status::{classify, KnownStatus, StatusClass};
pub use types::{MessageSnapshot, StartedConversation};

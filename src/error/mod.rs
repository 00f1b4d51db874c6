//! Error types for genie-console.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for all Genie and agent operations.
#[derive(Error, Debug)]
pub enum GenieError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-success HTTP status from the Genie API or the agent service.
    #[error("Protocol error (status {status}): {message}")]
    Protocol { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required field is missing from a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Polling gave up after {attempts} status checks ({elapsed_ms}ms)")]
    PollTimeout { attempts: u32, elapsed_ms: u64 },

    #[error("Genie message ended with status {status}")]
    MessageFailed { status: String },

    #[error("Unrecognized Genie message status {status} (seen {observations} times)")]
    UnrecognizedStatus { status: String, observations: u32 },

    #[error("Operation canceled")]
    Canceled,

    #[error("Agent runtime error: {0}")]
    Runtime(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Failed to delete {}: {message}", path.display())]
    Cleanup { path: PathBuf, message: String },
}

impl GenieError {
    /// Create a protocol error from an HTTP status and response body.
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            message: message.into(),
        }
    }

    /// Create a parse error for a field missing from a response.
    pub fn missing_field(field: &str) -> Self {
        Self::Parse(format!("missing required field `{field}`"))
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Protocol { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Protocol,
            },
            Self::Network(_) => ErrorCategory::Network,
            Self::Serialization(_) | Self::Parse(_) | Self::InvalidArgument(_) => {
                ErrorCategory::Parse
            }
            Self::PollTimeout { .. } => ErrorCategory::Timeout,
            Self::MessageFailed { .. } | Self::UnrecognizedStatus { .. } => {
                ErrorCategory::MessageStatus
            }
            Self::Cleanup { .. } => ErrorCategory::Cleanup,
            Self::Io(_) | Self::Canceled | Self::Runtime(_) | Self::InvalidState(_) => {
                ErrorCategory::Unknown
            }
        }
    }

    /// Whether this error should end the process rather than the current operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self.category(), ErrorCategory::Configuration)
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Timeout => RecoverySuggestion::IncreasePollingBudget,
            ErrorCategory::MessageStatus => RecoverySuggestion::RephrasePrompt,
            ErrorCategory::Network | ErrorCategory::Server => RecoverySuggestion::TryAgainLater,
            _ => RecoverySuggestion::None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GenieError>;

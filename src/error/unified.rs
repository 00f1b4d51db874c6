//! Error classification and recovery hints.

use std::fmt;

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Configuration,
    Network,
    Server,
    Protocol,
    Parse,
    Timeout,
    MessageStatus,
    Cleanup,
    Unknown,
}

/// Suggested recovery action shown next to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    CheckCredentials,
    CheckConfiguration,
    IncreasePollingBudget,
    RephrasePrompt,
    TryAgainLater,
    None,
}

impl fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hint = match self {
            Self::CheckCredentials => "check AuthToken / AgentApiKey",
            Self::CheckConfiguration => "check appsettings.toml and GENIE_* variables",
            Self::IncreasePollingBudget => "raise MaxPollAttempts or PollTimeoutSeconds",
            Self::RephrasePrompt => "rephrase the question and try again",
            Self::TryAgainLater => "try again later",
            Self::None => "",
        };
        f.write_str(hint)
    }
}

//! Genie message status vocabulary.

use strum::{Display, EnumString};

/// Status literals the Genie API is known to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum KnownStatus {
    Completed,
    Submitted,
    Pending,
    Running,
    InProgress,
    FetchingMetadata,
    FilteringContext,
    AskingAi,
    PendingWarehouse,
    ExecutingQuery,
    Failed,
    Cancelled,
    QueryResultExpired,
}

/// How the poller treats an observed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Exactly `"COMPLETED"`.
    Completed,
    /// Known to still be progressing.
    Pending,
    /// Known terminal failure.
    Failed,
    /// Anything else. Tolerated for a bounded number of observations.
    Unrecognized,
}

impl KnownStatus {
    pub fn class(self) -> StatusClass {
        match self {
            Self::Completed => StatusClass::Completed,
            Self::Failed | Self::Cancelled | Self::QueryResultExpired => StatusClass::Failed,
            _ => StatusClass::Pending,
        }
    }
}

/// Classify a raw status string. Matching is exact and case-sensitive.
pub fn classify(status: &str) -> StatusClass {
    status
        .parse::<KnownStatus>()
        .map(KnownStatus::class)
        .unwrap_or(StatusClass::Unrecognized)
}

//! Start → poll → retrieve workflow over a [`ConversationApi`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::client::{ConversationApi, ConversationClient};
use super::status::StatusClass;
use super::types::{MessageSnapshot, StartedConversation};
use crate::config::GenieSettings;
use crate::error::{GenieError, Result};

/// Delay between status checks when nothing else is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// How the poller waits for a message to complete.
///
/// Polling uses a fixed interval, with no backoff. Bounds left unset in the
/// builder are disabled; [`PollPolicy::default`] enables all of them.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PollPolicy {
    /// Pause between two status checks.
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub interval: Duration,
    /// Give up after this many status checks.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the conversation started.
    pub timeout: Option<Duration>,
    /// Consecutive unrecognized statuses tolerated before failing. Zero disables the check.
    #[builder(default = 3)]
    pub max_unrecognized: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(120),
            timeout: Some(Duration::from_secs(900)),
            max_unrecognized: 3,
        }
    }
}

/// Everything observed while driving one prompt to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub conversation: StartedConversation,
    /// The snapshot that reported completion.
    pub snapshot: MessageSnapshot,
    /// Raw query-result body.
    pub result: String,
    /// Number of status checks issued.
    pub attempts: u32,
}

/// Drives a conversation from start to its query result.
#[derive(Clone)]
pub struct PollingEngine {
    api: Arc<dyn ConversationApi>,
    policy: PollPolicy,
}

impl PollingEngine {
    pub fn new(api: Arc<dyn ConversationApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Build an engine over a real [`ConversationClient`].
    pub fn from_settings(settings: &GenieSettings) -> Result<Self> {
        Ok(Self::new(
            Arc::new(ConversationClient::from_settings(settings)?),
            settings.poll_policy.clone(),
        ))
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Run `prompt` to completion and return the raw result text.
    pub async fn run_to_completion(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        Ok(self.run(prompt, cancel, |_, _| {}).await?.result)
    }

    /// Run `prompt` to completion, reporting every status observation.
    ///
    /// Issues exactly one start call, one status call per iteration and one
    /// query-result call after the first `"COMPLETED"` observation.
    pub async fn run<F>(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
        mut on_status: F,
    ) -> Result<PollOutcome>
    where
        F: FnMut(&StartedConversation, &MessageSnapshot),
    {
        let started_at = Instant::now();
        let conversation = cancellable(cancel, self.api.start_conversation(prompt)).await?;
        info!(
            conversation_id = %conversation.conversation_id,
            message_id = %conversation.message_id,
            "Genie conversation started"
        );

        let mut attempts = 0u32;
        let mut unrecognized = 0u32;

        let snapshot = loop {
            let snapshot = cancellable(
                cancel,
                self.api
                    .message_status(&conversation.conversation_id, &conversation.message_id),
            )
            .await?;
            attempts += 1;
            on_status(&conversation, &snapshot);

            match snapshot.class() {
                StatusClass::Completed => break snapshot,
                StatusClass::Failed => {
                    return Err(GenieError::MessageFailed {
                        status: snapshot.status,
                    });
                }
                StatusClass::Pending => unrecognized = 0,
                StatusClass::Unrecognized => {
                    unrecognized += 1;
                    warn!(status = %snapshot.status, unrecognized, "Unrecognized Genie status");
                    if self.policy.max_unrecognized > 0
                        && unrecognized >= self.policy.max_unrecognized
                    {
                        return Err(GenieError::UnrecognizedStatus {
                            status: snapshot.status,
                            observations: unrecognized,
                        });
                    }
                }
            }

            let elapsed = started_at.elapsed();
            let timed_out = || GenieError::PollTimeout {
                attempts,
                elapsed_ms: elapsed.as_millis() as u64,
            };
            if self.policy.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(timed_out());
            }
            let mut delay = self.policy.interval;
            if let Some(timeout) = self.policy.timeout {
                let Some(remaining) = timeout.checked_sub(elapsed).filter(|r| !r.is_zero()) else {
                    return Err(timed_out());
                };
                delay = delay.min(remaining);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenieError::Canceled),
                _ = tokio::time::sleep(delay) => {}
            }
        };

        info!(attempts, "Genie message processing completed");
        if snapshot.attachment_id.is_empty() {
            warn!(
                message_id = %conversation.message_id,
                "Completed message has no attachment; requesting query result anyway"
            );
        }

        let result = cancellable(
            cancel,
            self.api.query_result(
                &conversation.conversation_id,
                &conversation.message_id,
                &snapshot.attachment_id,
            ),
        )
        .await?;

        Ok(PollOutcome {
            conversation,
            snapshot,
            result,
            attempts,
        })
    }
}

impl std::fmt::Debug for PollingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingEngine")
            .field("policy", &self.policy)
            .finish()
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GenieError::Canceled),
        result = future => result,
    }
}

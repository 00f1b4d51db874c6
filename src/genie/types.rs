//! Genie conversation types and wire formats.

use serde::{Deserialize, Serialize};

use super::status::{classify, StatusClass};
use crate::error::{GenieError, Result};

/// Ids assigned by the server when a conversation starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartedConversation {
    pub message_id: String,
    pub conversation_id: String,
}

/// One status observation of a message.
///
/// `attachment_id`, `query` and `description` are empty when the server has
/// not attached anything yet; that is a normal outcome, not a fault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageSnapshot {
    pub status: String,
    pub attachment_id: String,
    pub query: String,
    pub description: String,
}

impl MessageSnapshot {
    pub fn class(&self) -> StatusClass {
        classify(&self.status)
    }

    pub fn is_completed(&self) -> bool {
        self.class() == StatusClass::Completed
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartConversationRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartConversationResponse {
    message_id: Option<String>,
    conversation_id: Option<String>,
}

impl StartConversationResponse {
    pub(crate) fn into_started(self) -> Result<StartedConversation> {
        Ok(StartedConversation {
            message_id: self
                .message_id
                .ok_or_else(|| GenieError::missing_field("message_id"))?,
            conversation_id: self
                .conversation_id
                .ok_or_else(|| GenieError::missing_field("conversation_id"))?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageResponse {
    status: Option<String>,
    #[serde(default)]
    attachments: Option<Vec<AttachmentResponse>>,
}

#[derive(Debug, Deserialize)]
struct AttachmentResponse {
    attachment_id: Option<String>,
    query: Option<QueryResponse>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<String>,
    description: Option<String>,
}

impl MessageResponse {
    /// Only the first attachment is inspected.
    pub(crate) fn into_snapshot(self) -> Result<MessageSnapshot> {
        let mut snapshot = MessageSnapshot {
            status: self.status.ok_or_else(|| GenieError::missing_field("status"))?,
            ..Default::default()
        };

        let Some(first) = self.attachments.and_then(|a| a.into_iter().next()) else {
            return Ok(snapshot);
        };

        snapshot.attachment_id = first.attachment_id.unwrap_or_default();
        if !snapshot.attachment_id.is_empty() {
            if let Some(query) = first.query {
                snapshot.query = query.query.unwrap_or_default();
                snapshot.description = query.description.unwrap_or_default();
            }
        }

        Ok(snapshot)
    }
}

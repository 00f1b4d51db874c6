//! HTTP client for the Genie conversation API.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use super::types::{
    MessageResponse, MessageSnapshot, StartConversationRequest, StartConversationResponse,
    StartedConversation,
};
use crate::config::GenieSettings;
use crate::error::Result;
use crate::util::http::{bearer_headers, ensure_success, shared_client, trim_trailing_slash};

/// The three Genie calls the poller drives.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Start a conversation with `prompt` as its first message.
    async fn start_conversation(&self, prompt: &str) -> Result<StartedConversation>;

    /// Fetch the current status of a message.
    async fn message_status(
        &self,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<MessageSnapshot>;

    /// Fetch the raw query result of an attachment.
    async fn query_result(
        &self,
        conversation_id: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<String>;
}

/// Stateless client for one Genie space.
///
/// The bearer token is fixed at construction. The client can be reused for
/// any number of conversations in the same space.
#[derive(Debug, Clone)]
pub struct ConversationClient {
    base_url: String,
    space_id: String,
    headers: HeaderMap,
}

impl ConversationClient {
    pub fn new(
        base_url: impl Into<String>,
        space_id: impl Into<String>,
        auth_token: &str,
    ) -> Result<Self> {
        let base_url = base_url.into();
        Ok(Self {
            base_url: trim_trailing_slash(&base_url).to_string(),
            space_id: space_id.into(),
            headers: bearer_headers(auth_token)?,
        })
    }

    pub fn from_settings(settings: &GenieSettings) -> Result<Self> {
        Self::new(
            settings.base_address.clone(),
            settings.space_id.clone(),
            &settings.auth_token,
        )
    }

    pub fn space_id(&self) -> &str {
        &self.space_id
    }

    fn space_url(&self) -> String {
        format!("{}/api/2.0/genie/spaces/{}", self.base_url, self.space_id)
    }

    fn message_url(&self, conversation_id: &str, message_id: &str) -> String {
        format!(
            "{}/conversations/{conversation_id}/messages/{message_id}",
            self.space_url()
        )
    }
}

#[async_trait]
impl ConversationApi for ConversationClient {
    async fn start_conversation(&self, prompt: &str) -> Result<StartedConversation> {
        let url = format!("{}/start-conversation", self.space_url());
        debug!(space_id = %self.space_id, "Genie start_conversation");

        let resp = shared_client()
            .post(&url)
            .headers(self.headers.clone())
            .json(&StartConversationRequest { content: prompt })
            .send()
            .await?;
        let body = ensure_success(resp).await?.text().await?;

        serde_json::from_str::<StartConversationResponse>(&body)?.into_started()
    }

    async fn message_status(
        &self,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<MessageSnapshot> {
        let url = self.message_url(conversation_id, message_id);
        debug!(conversation_id, message_id, "Genie message_status");

        let resp = shared_client()
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let body = ensure_success(resp).await?.text().await?;

        serde_json::from_str::<MessageResponse>(&body)?.into_snapshot()
    }

    async fn query_result(
        &self,
        conversation_id: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/query-result/{attachment_id}",
            self.message_url(conversation_id, message_id)
        );
        debug!(conversation_id, message_id, attachment_id, "Genie query_result");

        let resp = shared_client()
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        Ok(ensure_success(resp).await?.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_genie_layout() {
        let client = ConversationClient::new("https://adb.example.net/", "space-9", "t").unwrap();
        assert_eq!(
            client.space_url(),
            "https://adb.example.net/api/2.0/genie/spaces/space-9"
        );
        assert_eq!(
            client.message_url("c1", "m1"),
            "https://adb.example.net/api/2.0/genie/spaces/space-9/conversations/c1/messages/m1"
        );
    }

    #[test]
    fn unusable_token_is_rejected_up_front() {
        let err = ConversationClient::new("https://adb.example.net", "space-9", "dapi\r\n")
            .unwrap_err();
        assert!(matches!(err, crate::error::GenieError::Configuration(_)));
    }
}

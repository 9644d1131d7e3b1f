use serde_json::json;

use super::item_path;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{Conversation, ItemResponse, ListResponse, Message};

const CONVERSATIONS_PATH: &str = "/chat/conversations";

#[derive(Clone)]
pub struct ChatService {
    http: HttpClient,
}

impl ChatService {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<Conversation>>(CONVERSATIONS_PATH)
            .await?
            .into_vec())
    }

    /// Start a direct (one participant, no name) or group conversation.
    ///
    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn create_conversation(
        &self,
        participant_ids: &[String],
        name: Option<&str>,
    ) -> Result<Conversation, ApiError> {
        let body = json!({
            "participantIds": participant_ids,
            "isGroup": participant_ids.len() > 1 || name.is_some(),
            "name": name,
        });
        Ok(self
            .http
            .post::<_, ItemResponse<Conversation>>(CONVERSATIONS_PATH, &body)
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        let path = format!("{}/messages", item_path(CONVERSATIONS_PATH, conversation_id));
        Ok(self
            .http
            .get::<ListResponse<Message>>(&path)
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn send_message(&self, conversation_id: &str, content: &str) -> Result<Message, ApiError> {
        let path = format!("{}/messages", item_path(CONVERSATIONS_PATH, conversation_id));
        Ok(self
            .http
            .post::<_, ItemResponse<Message>>(&path, &json!({ "content": content }))
            .await?
            .into_inner())
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

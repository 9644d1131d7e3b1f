//! Conversations and messages, kept fresh by polling.
//!
//! There is no push channel: the conversation list refreshes on one
//! interval and the open conversation's messages on a shorter one. Poll
//! failures are recorded on the state but not toasted.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use super::{ActionResult, Feedback, Resource, load, report};
use crate::config::PollingConfig;
use crate::error::ApiError;
use crate::notify::Notifier;
use crate::polling::Poller;
use crate::services::chat::ChatService;
use crate::types::{Conversation, Message};
use crate::validation;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatState {
    pub conversations: Resource<Vec<Conversation>>,
    pub active: Option<String>,
    pub messages: Resource<Vec<Message>>,
    pub sending: bool,
}

impl ChatState {
    #[must_use]
    pub fn unread_total(&self) -> u32 {
        self.conversations.data.iter().map(|c| c.unread_count).sum()
    }
}

#[derive(Clone)]
pub struct ChatStore {
    service: ChatService,
    notifier: Notifier,
    polling: PollingConfig,
    state: Arc<RwLock<ChatState>>,
}

impl ChatStore {
    #[must_use]
    pub fn new(service: ChatService, notifier: Notifier, polling: PollingConfig) -> Self {
        Self { service, notifier, polling, state: Arc::default() }
    }

    pub async fn snapshot(&self) -> ChatState {
        self.state.read().await.clone()
    }

    pub async fn load_conversations(&self) -> ActionResult {
        self.refresh_conversations(Feedback::Toast).await
    }

    /// Make `conversation_id` the active conversation and load its messages.
    pub async fn open(&self, conversation_id: &str) -> ActionResult {
        {
            let mut state = self.state.write().await;
            if state.active.as_deref() != Some(conversation_id) {
                state.active = Some(conversation_id.to_owned());
                state.messages = Resource::default();
            }
        }
        self.refresh_messages(Feedback::Toast).await
    }

    pub async fn close(&self) {
        let mut state = self.state.write().await;
        state.active = None;
        state.messages = Resource::default();
    }

    pub async fn start_conversation(&self, participant_ids: &[String], name: Option<&str>) -> ActionResult {
        if participant_ids.is_empty() {
            return report(&self.notifier, &ApiError::Validation("Choose at least one participant.".into()));
        }
        match self.service.create_conversation(participant_ids, name).await {
            Ok(conversation) => {
                let id = conversation.id.clone();
                {
                    let mut state = self.state.write().await;
                    state.conversations.data.retain(|c| c.id != id);
                    state.conversations.data.insert(0, conversation);
                }
                self.open(&id).await
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    /// Send to the active conversation.
    pub async fn send(&self, content: &str) -> ActionResult {
        if let Err(e) = validation::validate_message(content) {
            return report(&self.notifier, &e);
        }
        let Some(conversation_id) = self.state.read().await.active.clone() else {
            return report(&self.notifier, &ApiError::Validation("No conversation is open.".into()));
        };

        self.state.write().await.sending = true;
        let result = self.service.send_message(&conversation_id, content.trim()).await;

        let mut state = self.state.write().await;
        state.sending = false;
        match result {
            Ok(message) => {
                if state.active.as_deref() == Some(conversation_id.as_str())
                    && !state.messages.data.iter().any(|m| m.id == message.id)
                {
                    state.messages.data.push(message.clone());
                }
                if let Some(conversation) = state
                    .conversations
                    .data
                    .iter_mut()
                    .find(|c| c.id == conversation_id)
                {
                    conversation.updated_at.clone_from(&message.created_at);
                    conversation.last_message = Some(message);
                }
                ActionResult::ok()
            }
            Err(e) => {
                drop(state);
                report(&self.notifier, &e)
            }
        }
    }

    // =========================================================================
    // POLLING
    // =========================================================================

    /// Refresh the conversation list every `polling.conversations` until the
    /// returned handle is dropped.
    #[must_use]
    pub fn poll_conversations(&self) -> Poller {
        let store = self.clone();
        Poller::start(self.polling.conversations, move || {
            let store = store.clone();
            async move {
                store.refresh_conversations(Feedback::Quiet).await;
            }
        })
    }

    /// Refresh the active conversation's messages every `polling.messages`.
    /// Ticks with no open conversation do nothing.
    #[must_use]
    pub fn poll_messages(&self) -> Poller {
        let store = self.clone();
        Poller::start(self.polling.messages, move || {
            let store = store.clone();
            async move {
                store.refresh_messages(Feedback::Quiet).await;
            }
        })
    }

    async fn refresh_conversations(&self, feedback: Feedback) -> ActionResult {
        load(&self.state, &self.notifier, feedback, |s| &mut s.conversations, self.service.conversations()).await
    }

    async fn refresh_messages(&self, feedback: Feedback) -> ActionResult {
        let Some(conversation_id) = self.state.read().await.active.clone() else {
            return ActionResult::ok();
        };
        let result = self.service.messages(&conversation_id).await;

        let mut state = self.state.write().await;
        // The user may have switched conversations while the request was out.
        if state.active.as_deref() != Some(conversation_id.as_str()) {
            return ActionResult::ok();
        }
        match result {
            Ok(messages) => {
                state.messages.data = messages;
                state.messages.error = None;
                ActionResult::ok()
            }
            Err(e) => {
                state.messages.error = Some(e.user_message());
                drop(state);
                match feedback {
                    Feedback::Toast => report(&self.notifier, &e),
                    Feedback::Quiet => {
                        warn!(error = %e, conversation_id = %conversation_id, "message refresh failed");
                        ActionResult::from(&e)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

//! Request and reply models for the chat endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Error, Result};

/// Inbound chat request as it arrives on the wire.
///
/// Fields are optional here so that a missing field can be told apart from a
/// malformed body; presence is enforced by [`ChatRequest::validate`].
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatRequest {
    #[validate(required, length(min = 1))]
    pub assistant_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub messages: Option<Vec<IncomingMessage>>,
    #[validate(required, length(min = 1))]
    pub id_token: Option<String>,
}

/// One prior conversation turn supplied by the client.
///
/// Both fields must be strings. Any string role other than `assistant`
/// collapses to `user` later; a null, missing or non-string role is a
/// malformed body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

/// A chat request that passed shape validation.
#[derive(Debug, Clone)]
pub struct ValidatedChat {
    pub assistant_id: String,
    pub messages: Vec<ChatMessage>,
    pub id_token: String,
}

impl ValidatedChat {
    /// Parse and validate a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let request: ChatRequest =
            serde_json::from_slice(body).map_err(|e| Error::InvalidBody(e.to_string()))?;
        Self::try_from(request)
    }
}

impl TryFrom<ChatRequest> for ValidatedChat {
    type Error = Error;

    fn try_from(request: ChatRequest) -> Result<Self> {
        request.validate().map_err(|_| Error::MissingFields)?;

        match (request.assistant_id, request.messages, request.id_token) {
            (Some(assistant_id), Some(messages), Some(id_token)) => Ok(Self {
                assistant_id,
                messages: messages.into_iter().map(ChatMessage::from).collect(),
                id_token,
            }),
            _ => Err(Error::MissingFields),
        }
    }
}

/// Conversation roles understood upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    User,
    Assistant,
}

impl Role {
    /// Client roles collapse to `assistant` or `user`; nothing else passes.
    pub fn from_client(role: &str) -> Self {
        if role == "assistant" {
            Role::Assistant
        } else {
            Role::User
        }
    }
}

/// A client turn with its role normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<IncomingMessage> for ChatMessage {
    fn from(message: IncomingMessage) -> Self {
        Self {
            role: Role::from_client(&message.role),
            content: message.content,
        }
    }
}

/// Persona record stored under `assistants/{assistantId}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl AssistantConfig {
    pub fn prompt_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.prompt
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(fallback)
    }

    pub fn model_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
    }
}

/// Successful reply returned to the client.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
    pub usage: Option<serde_json::Value>,
}

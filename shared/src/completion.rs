//! Upstream text-generation client (OpenAI Responses API).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::{AssistantConfig, ChatMessage, Error, ProxySettings, Result, Role};

const RESPONSES_PATH: &str = "responses";
const NO_RESPONSE: &str = "No response";

/// One entry of the outbound conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamMessage {
    pub role: Role,
    pub content: String,
}

/// Tool capability declared to the upstream model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDecl {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reasoning {
    pub effort: String,
}

/// Request body for the responses endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<UpstreamMessage>,
    pub tools: Vec<ToolDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Reasoning>,
}

/// Compose the upstream request for one chat turn.
///
/// The persona prompt always goes first as the only developer message; every
/// client turn follows with its content cut to `max_message_chars`.
pub fn build_request(
    assistant: &AssistantConfig,
    messages: &[ChatMessage],
    settings: &ProxySettings,
) -> ResponsesRequest {
    let model = assistant.model_or(&settings.default_model).to_string();

    let mut input = Vec::with_capacity(messages.len() + 1);
    input.push(UpstreamMessage {
        role: Role::Developer,
        content: assistant.prompt_or(&settings.default_prompt).to_string(),
    });
    input.extend(messages.iter().map(|m| UpstreamMessage {
        role: match m.role {
            Role::Assistant => Role::Assistant,
            _ => Role::User,
        },
        content: truncate_chars(&m.content, settings.max_message_chars).to_string(),
    }));

    let reasoning = is_reasoning_model(&model, &settings.reasoning_model_prefixes).then(|| {
        Reasoning {
            effort: "minimal".to_string(),
        }
    });

    ResponsesRequest {
        model,
        input,
        tools: vec![ToolDecl {
            kind: "web_search".to_string(),
        }],
        reasoning,
    }
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Case-insensitive prefix match against the reasoning family tags.
pub fn is_reasoning_model(model: &str, prefixes: &[String]) -> bool {
    let model = model.to_ascii_lowercase();
    prefixes
        .iter()
        .any(|prefix| model.starts_with(&prefix.to_ascii_lowercase()))
}

/// Successful response body from the responses endpoint.
#[derive(Debug, Deserialize)]
pub struct ResponsesReply {
    #[serde(default)]
    pub output: Option<Vec<OutputItem>>,
    #[serde(default)]
    pub usage: Option<Value>,
    #[serde(default)]
    pub error: Option<UpstreamErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<Vec<ContentPart>>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ResponsesReply {
    /// Concatenated output text of every message item, in emission order.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .flatten()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter().flatten())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }

    /// Reply text with the upstream error message, then "No response", as fallbacks.
    pub fn reply_text(&self) -> String {
        let text = self.output_text();
        if !text.is_empty() {
            return text;
        }

        self.error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .filter(|m| !m.is_empty())
            .unwrap_or(NO_RESPONSE)
            .to_string()
    }
}

/// Upstream text-generation API.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn create_response(&self, api_key: &str, request: &ResponsesRequest)
        -> Result<ResponsesReply>;
}

/// HTTP client for the OpenAI responses endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    responses_url: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            responses_url: format!("{}/{}", base_url.trim_end_matches('/'), RESPONSES_PATH),
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn create_response(
        &self,
        api_key: &str,
        request: &ResponsesRequest,
    ) -> Result<ResponsesReply> {
        let response = self
            .http
            .post(&self.responses_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI request failed: {}", e);
                Error::Upstream {
                    status: None,
                    detail: "Failed to reach AI service".to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_else(|_| json!({}));
            error!(status = status.as_u16(), body = %body, "OpenAI API error");
            return Err(Error::Upstream {
                status: Some(status.as_u16()),
                detail: upstream_error_detail(status.as_u16(), &body),
            });
        }

        response.json::<ResponsesReply>().await.map_err(|e| {
            error!("Unreadable OpenAI response: {}", e);
            Error::Upstream {
                status: Some(status.as_u16()),
                detail: "Invalid response from AI service".to_string(),
            }
        })
    }
}

/// Upstream-supplied error message, or a fallback naming the status.
fn upstream_error_detail(status: u16, body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("OpenAI API returned status {}", status))
}

//! The chat proxy request pipeline.
//!
//! One request runs through a fixed sequence of gates: method check, shape
//! validation, token verification, credential lookup, assistant lookup,
//! payload build, upstream call, reply extraction. The first failing gate
//! ends the request with its own status and error body.

use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::completion::{build_request, CompletionService};
use crate::http::{error_response, json_response};
use crate::store::{load_api_key, load_assistant, ConfigStore};
use crate::{ChatReply, Error, IdentityVerifier, ProxySettings, Result, ValidatedChat};

/// Request handler holding the process-wide collaborators.
pub struct ChatProxy {
    verifier: Arc<dyn IdentityVerifier>,
    store: Arc<dyn ConfigStore>,
    completion: Arc<dyn CompletionService>,
    settings: ProxySettings,
}

impl ChatProxy {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        store: Arc<dyn ConfigStore>,
        completion: Arc<dyn CompletionService>,
        settings: ProxySettings,
    ) -> Self {
        Self {
            verifier,
            store,
            completion,
            settings,
        }
    }

    /// Handle one inbound request. Every failure becomes a JSON error response.
    pub async fn handle(
        &self,
        event: Request,
    ) -> std::result::Result<Response<Body>, lambda_http::Error> {
        let deadline = self.settings.request_timeout;
        let outcome = match tokio::time::timeout(deadline, self.process(&event)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Internal(format!(
                "Request exceeded {}s timeout",
                deadline.as_secs()
            ))),
        };

        match outcome {
            Ok(reply) => json_response(200, &reply),
            Err(err) => {
                if err.status_code() >= 500 {
                    error!("Chat request failed: {}", err);
                } else {
                    warn!("Chat request rejected: {}", err);
                }
                error_response(&err)
            }
        }
    }

    async fn process(&self, event: &Request) -> Result<ChatReply> {
        if *event.method() != Method::POST {
            return Err(Error::MethodNotAllowed(event.method().to_string()));
        }

        let chat = ValidatedChat::parse(event.body().as_ref())?;

        let user = self
            .verifier
            .verify(&chat.id_token)
            .await
            .map_err(|e| match e {
                Error::Auth(_) => e,
                other => Error::Auth(other.to_string()),
            })?;
        info!(
            user_id = %user.user_id,
            assistant_id = %chat.assistant_id,
            messages = chat.messages.len(),
            "Processing chat request"
        );

        let api_key = load_api_key(self.store.as_ref()).await?;
        let assistant = load_assistant(self.store.as_ref(), &chat.assistant_id).await?;

        let request = build_request(&assistant, &chat.messages, &self.settings);
        let reply = self.completion.create_response(&api_key, &request).await?;

        Ok(ChatReply {
            reply: reply.reply_text(),
            model: request.model,
            usage: reply.usage,
        })
    }
}

//! Shared library for the chat proxy Lambda.
//!
//! This crate provides the request pipeline, its collaborators (identity
//! verification, configuration documents, the upstream completion client)
//! and the HTTP helpers used by the Lambda binary.

pub mod auth;
pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod proxy;
pub mod secrets;
pub mod store;

pub use auth::{IdTokenClaims, IdentityVerifier, JwtVerifier, VerifiedUser};
pub use completion::{CompletionService, OpenAiClient, ResponsesReply, ResponsesRequest};
pub use config::{Config, ProxySettings, MAX_MESSAGE_CHARS};
pub use error::{Error, Result};
pub use models::{AssistantConfig, ChatMessage, ChatReply, ChatRequest, Role, ValidatedChat};
pub use proxy::ChatProxy;
pub use secrets::{get_database_credentials, get_secret, DatabaseCredentials};
pub use store::{ConfigStore, PgDocumentStore};

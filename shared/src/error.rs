//! Error types for the chat proxy Lambda.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end a chat request.
///
/// Each variant is a terminal outcome: the handler converts it straight into
/// a JSON response using [`Error::status_code`] and [`Error::public_message`].
/// The `Display` text is for logs only and may carry internal detail.
#[derive(Error, Debug)]
pub enum Error {
    /// Anything other than POST
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Body is not JSON, has unknown fields, or has mistyped fields
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// One of assistantId, messages, idToken is missing or empty
    #[error("Missing required fields")]
    MissingFields,

    /// ID token rejected or verifier unavailable
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Credential document or field absent
    #[error("API key not configured")]
    ApiKeyNotConfigured,

    /// Unknown assistant id
    #[error("Assistant not found: {0}")]
    AssistantNotFound(String),

    /// Upstream returned non-success, was unreachable, or sent an unreadable body
    #[error("Upstream error: {detail}")]
    Upstream { status: Option<u16>, detail: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidBody(_) | Error::MissingFields => 400,
            Error::Auth(_) => 401,
            Error::AssistantNotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            Error::Upstream { .. } => 502,
            _ => 500,
        }
    }

    /// Message safe to return to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            Error::MethodNotAllowed(_) => "Method not allowed",
            Error::InvalidBody(_) => "Invalid request body",
            Error::MissingFields => "Missing required fields: assistantId, messages, idToken",
            Error::Auth(_) => "Invalid auth token",
            Error::ApiKeyNotConfigured => "API key not configured",
            Error::AssistantNotFound(_) => "Assistant not found",
            Error::Upstream { .. } => "AI service error",
            _ => "Internal server error",
        }
    }

    /// Extra detail passed through to the client. Only upstream errors have one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Upstream { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(Error::MethodNotAllowed("GET".into()).status_code(), 405);
        assert_eq!(Error::MissingFields.status_code(), 400);
        assert_eq!(Error::InvalidBody("eof".into()).status_code(), 400);
        assert_eq!(Error::Auth("expired".into()).status_code(), 401);
        assert_eq!(Error::AssistantNotFound("a1".into()).status_code(), 404);
        assert_eq!(Error::ApiKeyNotConfigured.status_code(), 500);
        assert_eq!(Error::Internal("boom".into()).status_code(), 500);
        let upstream = Error::Upstream {
            status: Some(429),
            detail: "Rate limit".into(),
        };
        assert_eq!(upstream.status_code(), 502);
    }

    #[test]
    fn test_internal_detail_is_not_public() {
        let err = Error::Aws("secret arn:aws:secretsmanager:us-east-1:1234".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.detail().is_none());
    }
}

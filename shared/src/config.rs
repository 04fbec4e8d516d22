//! Configuration management for the chat proxy Lambda.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// Hard cap on the length of each client message sent upstream, in characters.
pub const MAX_MESSAGE_CHARS: usize = 10_000;

const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_PROMPT: &str = "You are a helpful assistant.";
const DEFAULT_REASONING_PREFIXES: &str = "o1,o3,o4,gpt-5";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: String,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: String,
    /// Table holding the configuration documents
    pub documents_table: String,
    /// AWS region
    pub aws_region: String,
    /// JWKS endpoint used to verify ID tokens
    pub auth_jwks_url: String,
    /// Expected `iss` claim
    pub auth_issuer: String,
    /// Expected `aud` claim
    pub auth_audience: String,
    /// Base URL of the completion API
    pub openai_base_url: String,
    /// Wall-clock bound for one request
    pub request_timeout: Duration,
    pub default_model: String,
    pub default_prompt: String,
    /// Model name prefixes that get the minimal reasoning directive
    pub reasoning_model_prefixes: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };
        let optional =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("REQUEST_TIMEOUT_SECS: {}", e)))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            db_host: required("DATABASE_HOST")?,
            db_name: optional("DATABASE_NAME", "chat_proxy"),
            db_secret_arn: required("DATABASE_URL_SECRET_ARN")?,
            documents_table: optional("DOCUMENTS_TABLE", "documents"),
            aws_region: optional("AWS_REGION", "us-east-1"),
            auth_jwks_url: required("AUTH_JWKS_URL")?,
            auth_issuer: required("AUTH_ISSUER")?,
            auth_audience: required("AUTH_AUDIENCE")?,
            openai_base_url: optional("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            request_timeout: Duration::from_secs(timeout_secs),
            default_model: optional("DEFAULT_MODEL", DEFAULT_MODEL),
            default_prompt: optional("DEFAULT_PROMPT", DEFAULT_PROMPT),
            reasoning_model_prefixes: parse_prefixes(&optional(
                "REASONING_MODEL_PREFIXES",
                DEFAULT_REASONING_PREFIXES,
            )),
        })
    }

    pub fn proxy_settings(&self) -> ProxySettings {
        ProxySettings {
            default_model: self.default_model.clone(),
            default_prompt: self.default_prompt.clone(),
            reasoning_model_prefixes: self.reasoning_model_prefixes.clone(),
            max_message_chars: MAX_MESSAGE_CHARS,
            request_timeout: self.request_timeout,
        }
    }
}

/// The part of the configuration the request pipeline needs.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub default_model: String,
    pub default_prompt: String,
    pub reasoning_model_prefixes: Vec<String>,
    pub max_message_chars: usize,
    pub request_timeout: Duration,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            default_prompt: DEFAULT_PROMPT.to_string(),
            reasoning_model_prefixes: parse_prefixes(DEFAULT_REASONING_PREFIXES),
            max_message_chars: MAX_MESSAGE_CHARS,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Split a comma-separated prefix list, lowercased, empties dropped.
fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_HOST", "db.internal"),
            ("DATABASE_URL_SECRET_ARN", "arn:aws:secretsmanager:us-east-1:1:secret:db"),
            ("AUTH_JWKS_URL", "https://example.com/jwks.json"),
            ("AUTH_ISSUER", "https://securetoken.google.com/demo"),
            ("AUTH_AUDIENCE", "demo"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.db_name, "chat_proxy");
        assert_eq!(config.documents_table, "documents");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.reasoning_model_prefixes, vec!["o1", "o3", "o4", "gpt-5"]);
    }

    #[test]
    fn test_missing_required_variable() {
        let mut env = base_env();
        env.remove("AUTH_AUDIENCE");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("AUTH_AUDIENCE"));
    }

    #[test]
    fn test_reasoning_prefixes_are_configurable() {
        let mut env = base_env();
        env.insert("REASONING_MODEL_PREFIXES", " O5, ,gpt-6 ");
        let config = load(&env).unwrap();
        assert_eq!(config.reasoning_model_prefixes, vec!["o5", "gpt-6"]);
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let mut env = base_env();
        env.insert("REQUEST_TIMEOUT_SECS", "soon");
        assert!(matches!(load(&env), Err(Error::Config(_))));
    }
}

//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;

use crate::{Error, Result};

/// Database credentials from Secrets Manager.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

/// Get a secret string from Secrets Manager.
///
/// Called once per cold start; the result lives in the process state.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    response
        .secret_string()
        .map(str::to_string)
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))
}

/// Get database credentials from Secrets Manager.
pub async fn get_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    let secret_string = get_secret(client, secret_arn).await?;
    parse_credentials(&secret_string)
}

fn parse_credentials(secret_string: &str) -> Result<DatabaseCredentials> {
    serde_json::from_str(secret_string)
        .map_err(|e| Error::Aws(format!("Failed to parse database credentials: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let json = r#"{"username":"proxy","password":"secret123","host":"db.example.com","port":5432,"dbname":"chat_proxy"}"#;
        let creds = parse_credentials(json).unwrap();
        assert_eq!(creds.username, "proxy");
        assert_eq!(creds.password, "secret123");
        assert_eq!(creds.port, Some(5432));
    }

    #[test]
    fn test_parse_credentials_minimal() {
        let creds = parse_credentials(r#"{"username":"u","password":"p"}"#).unwrap();
        assert!(creds.host.is_none());
        assert!(parse_credentials("{}").is_err());
    }
}

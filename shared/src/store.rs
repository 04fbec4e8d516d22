//! Configuration document store.
//!
//! Documents are JSON objects addressed by `(collection, key)`. The proxy
//! only reads two kinds: the API credential at `config/openai` and persona
//! records at `assistants/{assistantId}`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use crate::{AssistantConfig, Error, Result};

pub const CONFIG_COLLECTION: &str = "config";
pub const CREDENTIAL_KEY: &str = "openai";
pub const ASSISTANTS_COLLECTION: &str = "assistants";

/// Key-value document lookup.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;
}

/// Documents stored as JSONB rows in Postgres.
pub struct PgDocumentStore {
    pool: PgPool,
    select_sql: String,
}

impl PgDocumentStore {
    /// `table` must be a plain identifier; it is interpolated into the query.
    pub fn new(pool: PgPool, table: &str) -> Result<Self> {
        let valid = !table.is_empty()
            && table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid {
            return Err(Error::Config(format!("Invalid documents table: {}", table)));
        }

        Ok(Self {
            pool,
            select_sql: format!(
                "SELECT data FROM {} WHERE collection = $1 AND key = $2",
                table
            ),
        })
    }
}

#[async_trait]
impl ConfigStore for PgDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let data: Option<Value> = sqlx::query_scalar(&self.select_sql)
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(data)
    }
}

/// Read the upstream API key. Absence is a server misconfiguration.
pub async fn load_api_key(store: &dyn ConfigStore) -> Result<String> {
    let document = store
        .get(CONFIG_COLLECTION, CREDENTIAL_KEY)
        .await?
        .ok_or(Error::ApiKeyNotConfigured)?;

    document
        .get("apiKey")
        .and_then(Value::as_str)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or(Error::ApiKeyNotConfigured)
}

/// Read the persona record for `assistant_id`.
pub async fn load_assistant(store: &dyn ConfigStore, assistant_id: &str) -> Result<AssistantConfig> {
    let document = store
        .get(ASSISTANTS_COLLECTION, assistant_id)
        .await?
        .ok_or_else(|| Error::AssistantNotFound(assistant_id.to_string()))?;

    Ok(serde_json::from_value(document)?)
}

//! Chat Lambda - Handles the /chat endpoint.
//!
//! This Lambda verifies the caller's ID token, loads the API key and the
//! requested assistant persona from the document store, forwards the
//! conversation to the completion API and relays the reply. The API key and
//! the persona prompt never leave the server.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::db::create_pool;
use shared::http::{is_preflight, preflight_response};
use shared::{
    get_database_credentials, ChatProxy, Config, JwtVerifier, OpenAiClient, PgDocumentStore,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    proxy: ChatProxy,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let credentials = get_database_credentials(&secrets_client, &config.db_secret_arn).await?;
        let pool = create_pool(&config, &credentials).await?;
        let store = PgDocumentStore::new(pool, &config.documents_table)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let verifier = JwtVerifier::from_jwks_url(
            http_client.clone(),
            &config.auth_jwks_url,
            &config.auth_issuer,
            &config.auth_audience,
        )
        .await?;
        let completion = OpenAiClient::new(http_client, &config.openai_base_url);

        info!(
            region = %config.aws_region,
            timeout_secs = config.request_timeout.as_secs(),
            "Chat proxy initialized"
        );

        Ok(Self {
            proxy: ChatProxy::new(
                Arc::new(verifier),
                Arc::new(store),
                Arc::new(completion),
                config.proxy_settings(),
            ),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    if is_preflight(&event) {
        return preflight_response();
    }

    state.proxy.handle(event).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

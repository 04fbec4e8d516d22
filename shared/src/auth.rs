//! ID token verification.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{Error, Result};

/// Claims carried by an identity provider ID token.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject (user id)
    pub sub: String,
    /// Email
    pub email: Option<String>,
    /// Issued at
    #[serde(default)]
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// Caller identity established from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl TryFrom<IdTokenClaims> for VerifiedUser {
    type Error = Error;

    fn try_from(claims: IdTokenClaims) -> Result<Self> {
        if claims.sub.is_empty() {
            return Err(Error::Auth("Empty sub claim".to_string()));
        }

        Ok(Self {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

/// Validates an opaque client token and yields the caller's identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedUser>;
}

/// Shortest gap between two key set fetches triggered by unknown key ids.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct KeyCache {
    set: JwkSet,
    fetched_at: Instant,
}

/// Verifies signed JWT ID tokens against a JWKS.
pub struct JwtVerifier {
    http: reqwest::Client,
    jwks_url: Option<String>,
    keys: RwLock<KeyCache>,
    min_refresh_interval: Duration,
    validation: Validation,
}

impl JwtVerifier {
    /// Fetch the key set once and build an RS256 verifier for `issuer`/`audience`.
    pub async fn from_jwks_url(
        http: reqwest::Client,
        jwks_url: &str,
        issuer: &str,
        audience: &str,
    ) -> Result<Self> {
        let set = fetch_jwks(&http, jwks_url).await?;
        info!("Loaded {} signing keys from {}", set.keys.len(), jwks_url);

        Ok(Self {
            http,
            jwks_url: Some(jwks_url.to_string()),
            keys: RwLock::new(KeyCache {
                set,
                fetched_at: Instant::now(),
            }),
            min_refresh_interval: MIN_REFRESH_INTERVAL,
            validation: validation_for(Algorithm::RS256, issuer, audience),
        })
    }

    /// Build a verifier over a fixed key set that is never refreshed.
    pub fn with_keys(keys: JwkSet, algorithm: Algorithm, issuer: &str, audience: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            jwks_url: None,
            keys: RwLock::new(KeyCache {
                set: keys,
                fetched_at: Instant::now(),
            }),
            min_refresh_interval: MIN_REFRESH_INTERVAL,
            validation: validation_for(algorithm, issuer, audience),
        }
    }

    /// Accept tokens signed with `algorithm` instead.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.validation.algorithms = vec![algorithm];
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Find the key for `kid`.
    ///
    /// An unknown `kid` refetches the set, at most once per
    /// `min_refresh_interval`; fetches are serialized by the write lock.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let keys = self.keys.read().await;
            if let Some(jwk) = keys.set.find(kid) {
                return key_from_jwk(jwk);
            }
        }

        let unknown = || Error::Auth(format!("Unknown signing key: {}", kid));
        let Some(url) = self.jwks_url.as_deref() else {
            return Err(unknown());
        };

        let mut keys = self.keys.write().await;
        if let Some(jwk) = keys.set.find(kid) {
            return key_from_jwk(jwk);
        }
        if keys.fetched_at.elapsed() < self.min_refresh_interval {
            return Err(unknown());
        }

        warn!("Signing key {} not cached, refreshing key set", kid);
        keys.fetched_at = Instant::now();
        keys.set = fetch_jwks(&self.http, url).await?;

        let jwk = keys.set.find(kid).ok_or_else(unknown)?;
        key_from_jwk(jwk)
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        let header =
            decode_header(token).map_err(|e| Error::Auth(format!("Malformed token: {}", e)))?;
        let kid = header
            .kid
            .ok_or_else(|| Error::Auth("Token has no key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let token_data = decode::<IdTokenClaims>(token, &key, &self.validation)
            .map_err(|e| Error::Auth(format!("Failed to verify token: {}", e)))?;

        VerifiedUser::try_from(token_data.claims)
    }
}

fn validation_for(algorithm: Algorithm, issuer: &str, audience: &str) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
    validation
}

fn key_from_jwk(jwk: &jsonwebtoken::jwk::Jwk) -> Result<DecodingKey> {
    DecodingKey::from_jwk(jwk).map_err(|e| Error::Auth(format!("Unusable signing key: {}", e)))
}

async fn fetch_jwks(http: &reqwest::Client, url: &str) -> Result<JwkSet> {
    let response = http
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Auth(format!("Failed to fetch signing keys: {}", e)))?;

    response
        .json::<JwkSet>()
        .await
        .map_err(|e| Error::Auth(format!("Failed to parse signing keys: {}", e)))
}

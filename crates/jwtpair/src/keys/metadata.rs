//! Platform metadata server client
//!
//! Resolves the identity of the default service account and mints the OAuth access tokens the
//! remote signer authenticates with. Every request carries `Metadata-Flavor: Google`.

use crate::error::{Error, Result};
use crate::http::read_limited;
use crate::limits::MAX_REMOTE_RESPONSE_SIZE;
use crate::url::endpoint_base;
use miniserde::Deserialize;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

const DEFAULT_ACCOUNT_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default";

/// Access tokens are reused for at most this long
const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Client for the instance metadata server
#[derive(Clone)]
pub struct MetadataClient {
    client: reqwest::Client,
    base: String,
    tokens: Cache<(), String>,
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl MetadataClient {
    /// Client for the metadata server at `base`, e.g. `http://metadata.google.internal`
    pub fn new(client: reqwest::Client, base: &str) -> Result<Self> {
        Ok(Self {
            client,
            base: endpoint_base(base, "metadata URL")?,
            tokens: Cache::builder()
                .max_capacity(1)
                .time_to_live(ACCESS_TOKEN_TTL)
                .build(),
        })
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let request = self
            .client
            .get(format!("{}{DEFAULT_ACCOUNT_PATH}{path}", self.base))
            .header("Metadata-Flavor", "Google");
        read_limited(request, MAX_REMOTE_RESPONSE_SIZE)
            .await
            .map_err(|e| Error::Signing(format!("metadata {path}: {e}")))
    }

    /// Email of the default service account
    pub async fn service_account_email(&self) -> Result<String> {
        let body = self.get("/email").await?;
        let email = String::from_utf8(body)
            .map_err(|_| Error::Signing("metadata /email: response is not utf-8".into()))?;
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::Signing("metadata /email: empty response".into()));
        }
        Ok(email.to_string())
    }

    /// OAuth access token of the default service account
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.tokens.get(&()).await {
            return Ok(token);
        }

        let body = self.get("/token").await?;
        let body = std::str::from_utf8(&body)
            .map_err(|_| Error::Signing("metadata /token: response is not utf-8".into()))?;
        let response: AccessTokenResponse = miniserde::json::from_str(body)
            .map_err(|_| Error::Signing("metadata /token: invalid token json".into()))?;

        // Short-lived tokens are used once rather than outliving their expiry in the cache
        let cacheable = response
            .expires_in
            .is_some_and(|expires_in| expires_in > ACCESS_TOKEN_TTL.as_secs());
        if cacheable {
            debug!("caching metadata access token");
            self.tokens.insert((), response.access_token.clone()).await;
        }

        Ok(response.access_token)
    }
}

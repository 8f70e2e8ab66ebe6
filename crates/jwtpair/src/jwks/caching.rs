//! Cached key resolution against a remote JWKS document

use crate::algorithm::AlgorithmType;
use crate::error::Result;
use crate::jwks::jwk::check_algorithm;
use crate::jwks::{fetch_jwks, find_key_by_kid};
use crate::url::validate_endpoint_url;
use moka::future::Cache;
use std::collections::HashMap;
use tracing::debug;

/// Cache key for public keys: the `kid` a token names, `None` for a single-key set
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct KeyCacheKey {
    kid: Option<String>,
}

impl KeyCacheKey {
    fn new(kid: Option<&str>) -> Self {
        Self {
            kid: kid.map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedKey {
    der: Vec<u8>,
    alg: Option<String>,
}

/// Public keys published at a JWKS URI
///
/// Keys are fetched on the first lookup that misses the cache and kept for the lifetime of the
/// set. A single fetch populates every usable key in the document, so resolving the other kids
/// of the same document never goes back to the network. Failed lookups are not cached.
#[derive(Clone)]
pub struct RemoteKeySet {
    client: reqwest::Client,
    jwks_uri: String,
    cache: Cache<KeyCacheKey, CachedKey>,
}

impl std::fmt::Debug for RemoteKeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteKeySet")
            .field("jwks_uri", &self.jwks_uri)
            .field("cached_keys", &self.cache.entry_count())
            .finish()
    }
}

impl RemoteKeySet {
    /// Key set served at `jwks_uri`
    ///
    /// # Errors
    /// `ConfigurationInvalid` when `jwks_uri` is not a usable http(s) URL.
    pub fn new(client: reqwest::Client, jwks_uri: impl Into<String>) -> Result<Self> {
        let jwks_uri = jwks_uri.into();
        validate_endpoint_url(&jwks_uri, "JWKS URI")?;
        Ok(Self {
            client,
            jwks_uri,
            cache: Cache::builder().max_capacity(1000).build(),
        })
    }

    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// DER SubjectPublicKeyInfo of the key named `kid`, usable with `algorithm`
    pub async fn resolve(&self, kid: Option<&str>, algorithm: &AlgorithmType) -> Result<Vec<u8>> {
        let cache_key = KeyCacheKey::new(kid);

        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!(jwks_uri = %self.jwks_uri, kid, "key cache hit");
            check_algorithm(cached.alg.as_deref(), algorithm)?;
            return Ok(cached.der);
        }

        debug!(jwks_uri = %self.jwks_uri, kid, "key cache miss, fetching key set");
        let jwks = fetch_jwks(&self.client, &self.jwks_uri).await?;

        let mut kid_counts: HashMap<&str, usize> = HashMap::new();
        for other_kid in jwks.keys.iter().filter_map(|jwk| jwk.kid.as_deref()) {
            *kid_counts.entry(other_kid).or_default() += 1;
        }

        for jwk in &jwks.keys {
            let Some(other_kid) = jwk.kid.as_deref() else {
                continue;
            };
            // Ambiguous kids are never cached, so they keep failing resolution
            if kid_counts.get(other_kid).copied().unwrap_or_default() > 1 {
                continue;
            }
            // Unusable neighbours (EC, encryption keys) are skipped, not fatal
            if let Ok(der) = jwk.public_key_der() {
                let cached = CachedKey {
                    der,
                    alg: jwk.alg.clone(),
                };
                self.cache
                    .insert(KeyCacheKey::new(Some(other_kid)), cached)
                    .await;
            }
        }

        let jwk = find_key_by_kid(&jwks, kid)?;
        let der = jwk.to_key(algorithm)?;

        if kid.is_none() {
            let cached = CachedKey {
                der: der.clone(),
                alg: jwk.alg.clone(),
            };
            self.cache.insert(cache_key, cached).await;
        }

        Ok(der)
    }
}

//! JSON Web Key Set (JWKS) module
pub(crate) mod caching;
pub(crate) mod jwk;

use crate::error::{Error, KeyError, Result};
use crate::http::{HttpError, read_limited};
use crate::jwks::jwk::Jwk;
use crate::limits::{MAX_JWK_SET_SIZE, MAX_JWKS_RESPONSE_SIZE};
use miniserde::Deserialize;

pub use caching::RemoteKeySet;

/// JSON Web Key Set (JWKS)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JwkSet {
    /// The keys in the set
    pub keys: Vec<Jwk>,
}

/// Fetch and parse a JWKS document
pub(crate) async fn fetch_jwks(client: &reqwest::Client, jwks_uri: &str) -> Result<JwkSet> {
    let bytes = read_limited(client.get(jwks_uri), MAX_JWKS_RESPONSE_SIZE)
        .await
        .map_err(|e| match e {
            HttpError::TooLarge { .. } => {
                Error::KeyResolution(KeyError::Malformed(format!("jwks: {e}")))
            }
            _ => Error::KeyResolution(KeyError::Unreachable(format!("jwks: {e}"))),
        })?;

    let body = std::str::from_utf8(&bytes).map_err(|e| {
        Error::KeyResolution(KeyError::Malformed(format!(
            "jwks: utf8 decode failed: {e}"
        )))
    })?;

    let set: JwkSet = miniserde::json::from_str(body).map_err(|_| {
        Error::KeyResolution(KeyError::Malformed("jwks: invalid jwks json".into()))
    })?;

    if set.keys.len() > MAX_JWK_SET_SIZE {
        return Err(Error::KeyResolution(KeyError::Malformed(format!(
            "jwks: {} keys (maximum: {MAX_JWK_SET_SIZE} keys)",
            set.keys.len()
        ))));
    }

    Ok(set)
}

/// Find a key in a JWKS by key ID (kid)
///
/// Without a kid, only a set holding exactly one key is unambiguous.
pub(crate) fn find_key_by_kid<'a>(jwks: &'a JwkSet, kid: Option<&str>) -> Result<&'a Jwk> {
    let not_found = |msg: String| Error::KeyResolution(KeyError::NotFound(msg));

    match kid {
        Some(kid) => {
            let mut matches = jwks.keys.iter().filter(|k| k.kid.as_deref() == Some(kid));
            match (matches.next(), matches.next()) {
                (Some(jwk), None) => Ok(jwk),
                (None, _) => Err(not_found(format!("jwks: no key with kid '{kid}'"))),
                (Some(_), Some(_)) => Err(Error::KeyResolution(KeyError::Malformed(format!(
                    "jwks: multiple keys with kid '{kid}'"
                )))),
            }
        }
        None => match jwks.keys.as_slice() {
            [jwk] => Ok(jwk),
            [] => Err(not_found("jwks: no keys in set".into())),
            keys => Err(not_found(format!(
                "jwks: token has no kid and the set holds {} keys",
                keys.len()
            ))),
        },
    }
}

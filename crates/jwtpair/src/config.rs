//! Issuer and verifier configuration
//!
//! Both sides can be configured explicitly or from the process environment:
//!
//! | Variable                           | Used by  | Default                                   |
//! |------------------------------------|----------|-------------------------------------------|
//! | `SIGNING_SERVICE_ACCOUNT_KEY_PATH` | issuer   | unset: sign remotely                      |
//! | `SIGNING_SERVICE_ACCOUNT`          | issuer   | unset: ask the metadata server            |
//! | `API_AUDIENCE`                     | both     | `simple_api`                              |
//! | `TOKEN_LIFETIME_SECS`              | issuer   | `3600`                                    |
//! | `SERVICE_ACCOUNT_ISSUER`           | verifier | required                                  |
//! | `JWKS_URI`                         | verifier | Google robot JWKS of the issuer           |
//! | `TOKEN_ALGORITHMS`                 | verifier | `RS256`                                   |
//! | `IAM_CREDENTIALS_URL`              | issuer   | `https://iamcredentials.googleapis.com/v1`|
//! | `METADATA_SERVER_URL`              | issuer   | `http://metadata.google.internal`         |

use crate::algorithm::AlgorithmPolicy;
use crate::error::{Error, Result};
use std::path::PathBuf;

pub const DEFAULT_AUDIENCE: &str = "simple_api";
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;
pub const DEFAULT_IAM_CREDENTIALS_URL: &str = "https://iamcredentials.googleapis.com/v1";
pub const DEFAULT_METADATA_SERVER_URL: &str = "http://metadata.google.internal";

const GOOGLE_JWKS_URI_PREFIX: &str = "https://www.googleapis.com/robot/v1/metadata/jwk/";

/// JWKS URI Google publishes for a service account's public keys
pub fn google_jwks_uri(service_account: &str) -> String {
    format!("{GOOGLE_JWKS_URI_PREFIX}{service_account}")
}

/// Non-empty value of `name`
fn lookup_value(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Base URLs of the signing and metadata services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoints {
    pub iam_credentials: String,
    pub metadata_server: String,
}

impl Default for RemoteEndpoints {
    fn default() -> Self {
        Self {
            iam_credentials: DEFAULT_IAM_CREDENTIALS_URL.to_string(),
            metadata_server: DEFAULT_METADATA_SERVER_URL.to_string(),
        }
    }
}

impl RemoteEndpoints {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            iam_credentials: lookup_value(lookup, "IAM_CREDENTIALS_URL")
                .unwrap_or(defaults.iam_credentials),
            metadata_server: lookup_value(lookup, "METADATA_SERVER_URL")
                .unwrap_or(defaults.metadata_server),
        }
    }
}

/// Where issued tokens get signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningConfig {
    /// In process, with the private key of a service account key file
    LocalKey { path: PathBuf },
    /// By the remote signing endpoint, as `account` or as the metadata server's default account
    Remote { account: Option<String> },
}

/// Issuer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    pub signing: SigningConfig,
    pub audience: String,
    pub lifetime_secs: u64,
    pub endpoints: RemoteEndpoints,
}

impl IssuerConfig {
    /// Sign with the key file at `path`
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::with_signing(SigningConfig::LocalKey { path: path.into() })
    }

    /// Sign remotely, as `account` when given
    pub fn remote(account: Option<String>) -> Self {
        Self::with_signing(SigningConfig::Remote { account })
    }

    fn with_signing(signing: SigningConfig) -> Self {
        Self {
            signing,
            audience: DEFAULT_AUDIENCE.to_string(),
            lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            endpoints: RemoteEndpoints::default(),
        }
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value
    ///
    /// A key file path selects local signing; without one, tokens are signed remotely.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let signing = match lookup_value(&lookup, "SIGNING_SERVICE_ACCOUNT_KEY_PATH") {
            Some(path) => SigningConfig::LocalKey { path: path.into() },
            None => SigningConfig::Remote {
                account: lookup_value(&lookup, "SIGNING_SERVICE_ACCOUNT"),
            },
        };

        let lifetime_secs = match lookup_value(&lookup, "TOKEN_LIFETIME_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    Error::ConfigurationInvalid(format!(
                        "TOKEN_LIFETIME_SECS must be a positive integer, found '{value}'"
                    ))
                })?,
            None => DEFAULT_TOKEN_LIFETIME_SECS,
        };

        Ok(Self {
            signing,
            audience: lookup_value(&lookup, "API_AUDIENCE")
                .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            lifetime_secs,
            endpoints: RemoteEndpoints::from_lookup(&lookup),
        })
    }
}

/// Verifier configuration
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub issuer: String,
    pub audience: String,
    pub jwks_uri: String,
    pub algorithms: AlgorithmPolicy,
}

impl VerifierConfig {
    /// Accept RS256 tokens from `issuer`, with keys from Google's JWKS for that account
    pub fn new(issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        Self {
            jwks_uri: google_jwks_uri(&issuer),
            issuer,
            audience: DEFAULT_AUDIENCE.to_string(),
            algorithms: AlgorithmPolicy::rs256_only(),
        }
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let issuer = lookup_value(&lookup, "SERVICE_ACCOUNT_ISSUER").ok_or_else(|| {
            Error::ConfigurationInvalid("SERVICE_ACCOUNT_ISSUER is required".into())
        })?;
        Self::with_lookup(issuer, &lookup)
    }

    /// Like [`VerifierConfig::from_env`], accepting tokens from `issuer` when
    /// `SERVICE_ACCOUNT_ISSUER` is unset
    pub fn from_env_or_issuer(issuer: &str) -> Result<Self> {
        Self::from_lookup_or_issuer(issuer, env_lookup)
    }

    /// Like [`VerifierConfig::from_lookup`], accepting tokens from `issuer` when
    /// `SERVICE_ACCOUNT_ISSUER` is unset
    pub fn from_lookup_or_issuer(
        issuer: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let issuer =
            lookup_value(&lookup, "SERVICE_ACCOUNT_ISSUER").unwrap_or_else(|| issuer.to_string());
        Self::with_lookup(issuer, &lookup)
    }

    fn with_lookup(issuer: String, lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new(issuer);
        if let Some(audience) = lookup_value(lookup, "API_AUDIENCE") {
            config.audience = audience;
        }
        if let Some(jwks_uri) = lookup_value(lookup, "JWKS_URI") {
            config.jwks_uri = jwks_uri;
        }
        if let Some(names) = lookup_value(lookup, "TOKEN_ALGORITHMS") {
            config.algorithms = AlgorithmPolicy::from_names(names.split(',').map(str::trim))?;
        }
        Ok(config)
    }
}

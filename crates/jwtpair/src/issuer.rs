//! Token issuance

use crate::claims::{Claims, current_time};
use crate::codec;
use crate::config::IssuerConfig;
use crate::error::{Error, Result};
use crate::keys::Signer;
use miniserde::json::Object;
use tracing::error;

/// A freshly issued token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    /// Seconds until the token expires, read back from the token itself
    pub expires_in: i64,
}

/// Mints signed tokens for authenticated principals
#[derive(Debug, Clone)]
pub struct Issuer {
    signer: Signer,
    audience: String,
    lifetime_secs: u64,
}

impl Issuer {
    /// Issuer signing with `signer`, for tokens addressed to `audience`
    ///
    /// # Errors
    /// `ConfigurationInvalid` for an empty audience or a zero lifetime.
    pub fn new(
        signer: impl Into<Signer>,
        audience: impl Into<String>,
        lifetime_secs: u64,
    ) -> Result<Self> {
        let audience = audience.into();
        if audience.trim().is_empty() {
            return Err(Error::ConfigurationInvalid("audience cannot be empty".into()));
        }
        if lifetime_secs == 0 || i64::try_from(lifetime_secs).is_err() {
            return Err(Error::ConfigurationInvalid(format!(
                "token lifetime {lifetime_secs}s is out of range"
            )));
        }
        Ok(Self {
            signer: signer.into(),
            audience,
            lifetime_secs,
        })
    }

    /// Build the signer and issuer `config` describes
    pub async fn from_config(config: &IssuerConfig, client: reqwest::Client) -> Result<Self> {
        let signer = Signer::from_config(&config.signing, &config.endpoints, client).await?;
        Self::new(signer, config.audience.clone(), config.lifetime_secs)
    }

    /// The `iss` of every issued token
    pub fn identity(&self) -> &str {
        self.signer.identity()
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Issue a token carrying `additional` claims next to `iss`, `aud`, `iat` and `exp`
    ///
    /// # Errors
    /// `ReservedClaim` if `additional` names a registered claim. `Issuance` wraps any signing
    /// failure; the cause is logged here and should not be shown to clients.
    pub async fn issue(&self, additional: Object) -> Result<IssuedToken> {
        let issued_at = current_time().floor() as i64;
        let mut claims = Claims::standard(
            self.identity(),
            &self.audience,
            issued_at,
            self.lifetime_secs,
        )?;
        claims.extend(additional)?;

        let access_token = self
            .signer
            .sign_claims(&claims)
            .await
            .and_then(|token| codec::extract_expiry(&token).map(|exp| (token, exp)));

        let (access_token, expiration) = access_token.map_err(|e| {
            error!(error = %e, identity = self.identity(), "token issuance failed");
            Error::Issuance(Box::new(e))
        })?;

        Ok(IssuedToken {
            access_token,
            expires_in: (expiration as f64 - current_time()).floor() as i64,
        })
    }
}

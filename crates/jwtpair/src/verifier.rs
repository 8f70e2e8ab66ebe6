use crate::algorithm::{AlgorithmPolicy, AlgorithmType};
use crate::claims::{Claims, ClaimsValidation, current_time};
use crate::codec;
use crate::config::VerifierConfig;
use crate::error::{Error, Result};
use crate::header::TokenHeader;
use crate::jwks::RemoteKeySet;
use std::sync::Arc;

/// Where verification keys come from
#[derive(Debug, Clone)]
enum KeySource {
    Static(Arc<[u8]>),
    KeySet(RemoteKeySet),
}

/// Token verifier
///
/// The verifier is configured once and can be reused for multiple token verifications. Clones
/// share the key set cache.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    config_algorithms: AlgorithmPolicy,
    config_claims: Option<ClaimsValidation>,
    config_key: Option<KeySource>,
}

impl TokenVerifier {
    /// Create a new verifier with secure defaults (RS256 only)
    pub fn new() -> Self {
        Self {
            config_algorithms: AlgorithmPolicy::rs256_only(),
            config_claims: None,
            config_key: None,
        }
    }

    /// Verifier for `config`, resolving keys from its JWKS URI
    pub fn from_config(config: &VerifierConfig, client: reqwest::Client) -> Result<Self> {
        let key_set = RemoteKeySet::new(client, config.jwks_uri.clone())?;
        Self::new()
            .algorithms(config.algorithms.clone())
            .expect_claims(ClaimsValidation::new(
                config.issuer.clone(),
                config.audience.clone(),
            ))
            .key_set(key_set)
            .build()
    }

    /// Configure the algorithm policy
    pub fn algorithms(&mut self, policy: AlgorithmPolicy) -> &mut Self {
        self.config_algorithms = policy;
        self
    }

    /// Configure the expected issuer and audience
    pub fn expect_claims(&mut self, validation: ClaimsValidation) -> &mut Self {
        self.config_claims = Some(validation);
        self
    }

    /// Configure a static verification key (DER SubjectPublicKeyInfo or PKCS#1 RSAPublicKey)
    pub fn key(&mut self, key_der: &[u8]) -> &mut Self {
        self.config_key = Some(KeySource::Static(key_der.into()));
        self
    }

    /// Configure a remote key set
    pub fn key_set(&mut self, key_set: RemoteKeySet) -> &mut Self {
        self.config_key = Some(KeySource::KeySet(key_set));
        self
    }

    /// Finish configuration
    ///
    /// # Errors
    /// `ConfigurationInvalid` unless both the expected claims and a key source are configured.
    pub fn build(&mut self) -> Result<Self> {
        if self.config_claims.is_none() {
            return Err(Error::ConfigurationInvalid(
                "Must configure expected issuer and audience".into(),
            ));
        }
        if self.config_key.is_none() {
            return Err(Error::ConfigurationInvalid(
                "Must configure key OR key set".into(),
            ));
        }
        Ok(self.clone())
    }
}

impl TokenVerifier {
    /// Verify a compact token
    ///
    /// Returns the claims if the signature and the `iss`, `aud` and `exp` claims check out.
    /// Structural failures are reported before any key is resolved.
    pub async fn verify(&self, token: &str) -> Result<Claims> {
        let validation = self.config_claims.as_ref().ok_or_else(|| {
            Error::ConfigurationInvalid("Must configure expected issuer and audience".into())
        })?;

        // 1-3. Split, decode header and payload, check the algorithm
        let (header_b64, payload_b64, signature_b64) = codec::split_compact(token)?;
        let header = TokenHeader::decode(header_b64)?;
        let algorithm = AlgorithmType::parse(&header.algorithm, &self.config_algorithms)?;
        let claims = codec::decode_payload(payload_b64)?;

        // 4. Resolve verification key
        let key = self
            .resolve_verification_key(header.key_id.as_deref(), &algorithm)
            .await?;

        // 5. Verify signature
        let signing_input = format!("{header_b64}.{payload_b64}");
        algorithm.verify_signature(&signing_input, signature_b64, &key)?;

        // 6. Validate claims
        validation.validate(&claims, current_time().floor() as i64)?;

        Ok(claims)
    }

    async fn resolve_verification_key(
        &self,
        kid: Option<&str>,
        algorithm: &AlgorithmType,
    ) -> Result<Vec<u8>> {
        match &self.config_key {
            Some(KeySource::Static(key)) => Ok(key.to_vec()),
            Some(KeySource::KeySet(key_set)) => key_set.resolve(kid, algorithm).await,
            None => Err(Error::ConfigurationInvalid(
                "Must configure key OR key set".into(),
            )),
        }
    }
}

impl Default for TokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClaimError;
    use crate::header::signing_header;
    use crate::keys::LocalSigner;
    use miniserde::json::{Object, Value};
    use rsa::RsaPrivateKey;
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};

    const ISSUER: &str = "signer@example.com";

    fn signer() -> LocalSigner {
        let key =
            RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("Failed to generate key");
        let pem = key.to_pkcs8_pem(LineEnding::LF).unwrap();
        LocalSigner::from_pem("key-1", ISSUER, &pem).unwrap()
    }

    fn verifier(signer: &LocalSigner) -> TokenVerifier {
        TokenVerifier::new()
            .expect_claims(ClaimsValidation::new(ISSUER, "simple_api"))
            .key(&signer.public_key_der())
            .build()
            .unwrap()
    }

    fn now() -> i64 {
        current_time() as i64
    }

    #[test]
    fn test_build_requires_claims_and_key() {
        assert!(matches!(
            TokenVerifier::new().key(&[0x30]).build(),
            Err(Error::ConfigurationInvalid(_))
        ));
        assert!(matches!(
            TokenVerifier::new()
                .expect_claims(ClaimsValidation::new(ISSUER, "simple_api"))
                .build(),
            Err(Error::ConfigurationInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_static_key() {
        let signer = signer();
        let claims = Claims::standard(ISSUER, "simple_api", now(), 60).unwrap();
        let token = signer.sign_claims(&claims).unwrap();

        let verified = verifier(&signer).verify(&token).await.unwrap();
        assert_eq!(verified.to_json(), claims.to_json());
    }

    #[tokio::test]
    async fn test_verify_rejects_foreign_algorithm() {
        let signer = signer();
        let claims = Claims::standard(ISSUER, "simple_api", now(), 60).unwrap();

        let mut header = Object::new();
        header.insert("alg".into(), Value::String("none".into()));
        let token = format!("{}.", codec::serialize(&header, claims.as_object()));

        assert!(matches!(
            verifier(&signer).verify(&token).await,
            Err(Error::UnsupportedAlgorithm { found, .. }) if found == "none"
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_disallowed_rsa_algorithm() {
        let signer = signer();
        let claims = Claims::standard(ISSUER, "simple_api", now(), 60).unwrap();
        let signing_input =
            codec::serialize(&signing_header(AlgorithmType::RS512, "key-1"), claims.as_object());
        let token = codec::assemble(&signing_input, b"sig");

        assert!(matches!(
            verifier(&signer).verify(&token).await,
            Err(Error::UnsupportedAlgorithm { found, .. }) if found == "RS512"
        ));
    }

    #[tokio::test]
    async fn test_verify_expired() {
        let signer = signer();
        let claims = Claims::standard(ISSUER, "simple_api", now() - 120, 60).unwrap();
        let token = signer.sign_claims(&claims).unwrap();

        assert!(matches!(
            verifier(&signer).verify(&token).await,
            Err(Error::ClaimValidation(ClaimError::Expired { .. }))
        ));
    }

    #[tokio::test]
    async fn test_verify_wrong_key() {
        let claims = Claims::standard(ISSUER, "simple_api", now(), 60).unwrap();
        let token = signer().sign_claims(&claims).unwrap();

        assert!(matches!(
            verifier(&signer()).verify(&token).await,
            Err(Error::InvalidSignature)
        ));
    }
}

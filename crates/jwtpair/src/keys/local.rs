//! Signing with a private key loaded from a service account key file

use crate::algorithm::AlgorithmType;
use crate::claims::Claims;
use crate::codec;
use crate::error::{Error, Result};
use crate::header::signing_header;
use crate::utils::der::{PrivateKeyDer, private_key_from_pem};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{KeyPair, RsaKeyPair};
use miniserde::Deserialize;
use std::path::Path;
use std::sync::Arc;

const SIGNING_ALGORITHM: AlgorithmType = AlgorithmType::RS256;

/// The members of a service account key file this crate reads
#[derive(Deserialize)]
struct ServiceAccountKey {
    private_key_id: String,
    private_key: String,
    client_email: String,
}

/// RS256 signer holding a private key in process
#[derive(Clone)]
pub struct LocalSigner {
    key_id: String,
    identity: String,
    keypair: Arc<RsaKeyPair>,
    rng: SystemRandom,
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("key_id", &self.key_id)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl LocalSigner {
    /// Load a service account key file
    ///
    /// # Errors
    /// `Signing` if the file cannot be read or holds no usable RSA key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Signing(format!("cannot read key file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse the JSON contents of a service account key file
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ServiceAccountKey = miniserde::json::from_str(json).map_err(|_| {
            Error::Signing(
                "key file must be JSON with private_key_id, private_key and client_email".into(),
            )
        })?;
        Self::from_pem(key.private_key_id, key.client_email, &key.private_key)
    }

    /// Signer for a PEM encoded RSA private key (PKCS#8 or PKCS#1)
    pub fn from_pem(
        key_id: impl Into<String>,
        identity: impl Into<String>,
        pem: &str,
    ) -> Result<Self> {
        let keypair = match private_key_from_pem(pem)? {
            PrivateKeyDer::Pkcs8(der) => RsaKeyPair::from_pkcs8(&der),
            PrivateKeyDer::Pkcs1(der) => RsaKeyPair::from_der(&der),
        }
        .map_err(|e| Error::Signing(format!("rejected private key: {e}")))?;

        Ok(Self {
            key_id: key_id.into(),
            identity: identity.into(),
            keypair: Arc::new(keypair),
            rng: SystemRandom::new(),
        })
    }

    /// Key identifier placed in the `kid` header
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Service account the key belongs to, used as the token issuer
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// DER encoded public key (PKCS#1 RSAPublicKey)
    pub fn public_key_der(&self) -> Vec<u8> {
        self.keypair.public_key().as_ref().to_vec()
    }

    /// RSASSA-PKCS1-v1_5 SHA-256 signature over `message`
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let mut signature = vec![0u8; self.keypair.public_modulus_len()];
        self.keypair
            .sign(
                SIGNING_ALGORITHM.signing_algorithm(),
                &self.rng,
                message,
                &mut signature,
            )
            .map_err(|_| Error::Signing("rsa signing failed".into()))?;
        Ok(signature)
    }

    /// Compact token for `claims`, with header `{alg: RS256, kid, typ: JWT}`
    pub fn sign_claims(&self, claims: &Claims) -> Result<String> {
        let header = signing_header(SIGNING_ALGORITHM, &self.key_id);
        let signing_input = codec::serialize(&header, claims.as_object());
        let signature = self.sign(signing_input.as_bytes())?;
        Ok(codec::assemble(&signing_input, &signature))
    }
}

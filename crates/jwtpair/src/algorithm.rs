//! Signature algorithms
use crate::error::{Error, Result};
use crate::limits::{MAX_ALG_LENGTH, MAX_DECODED_SIGNATURE_SIZE};
use crate::utils::base64url;

use aws_lc_rs::signature::{self, UnparsedPublicKey};

/// Algorithm identifier from the token header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmType {
    RS256,
    RS384,
    RS512,
}

impl AlgorithmType {
    /// Parse the `alg` header value
    ///
    /// Anything outside the RSA family, `none` included, is rejected against `policy` so the
    /// error lists what would have been accepted.
    pub(crate) fn parse(s: &str, policy: &AlgorithmPolicy) -> Result<Self> {
        if s.len() > MAX_ALG_LENGTH {
            let truncated: String = s.chars().take(MAX_ALG_LENGTH).collect();
            return Err(policy.rejection(&truncated));
        }

        let algorithm = match s {
            "RS256" => AlgorithmType::RS256,
            "RS384" => AlgorithmType::RS384,
            "RS512" => AlgorithmType::RS512,
            _ => return Err(policy.rejection(s)),
        };
        policy.validate(&algorithm)?;
        Ok(algorithm)
    }

    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlgorithmType::RS256 => "RS256",
            AlgorithmType::RS384 => "RS384",
            AlgorithmType::RS512 => "RS512",
        }
    }

    fn verification_algorithm(&self) -> &'static dyn signature::VerificationAlgorithm {
        match self {
            AlgorithmType::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            AlgorithmType::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            AlgorithmType::RS512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        }
    }

    pub(crate) fn signing_algorithm(&self) -> &'static dyn signature::RsaEncoding {
        match self {
            AlgorithmType::RS256 => &signature::RSA_PKCS1_SHA256,
            AlgorithmType::RS384 => &signature::RSA_PKCS1_SHA384,
            AlgorithmType::RS512 => &signature::RSA_PKCS1_SHA512,
        }
    }

    /// Verify a signature segment
    ///
    /// # Arguments
    /// * `signing_input` - The data that was signed (header.payload)
    /// * `signature` - The Base64URL-encoded signature segment
    /// * `key_der` - The DER-encoded public key (SubjectPublicKeyInfo or RSAPublicKey)
    pub(crate) fn verify_signature(
        &self,
        signing_input: &str,
        signature: &str,
        key_der: &[u8],
    ) -> Result<()> {
        let signature_bytes = base64url::decode_bytes(signature, MAX_DECODED_SIGNATURE_SIZE)?;
        let public_key = UnparsedPublicKey::new(self.verification_algorithm(), key_der);

        public_key
            .verify(signing_input.as_bytes(), &signature_bytes)
            .map_err(|_| Error::InvalidSignature)
    }
}

impl std::fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for AlgorithmType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Set of algorithms a verifier accepts
#[derive(Debug, Clone)]
pub struct AlgorithmPolicy {
    allowed: Vec<AlgorithmType>,
}

impl AlgorithmPolicy {
    /// Policy that allows only RS256
    pub fn rs256_only() -> Self {
        Self::allow_only(vec![AlgorithmType::RS256])
    }

    /// Policy that allows all RSA algorithms (RS256, RS384, RS512)
    pub fn rsa_all() -> Self {
        Self::allow_only(vec![
            AlgorithmType::RS256,
            AlgorithmType::RS384,
            AlgorithmType::RS512,
        ])
    }

    /// Create a policy that allows only specific algorithms
    pub fn allow_only(algorithms: Vec<AlgorithmType>) -> Self {
        Self {
            allowed: algorithms,
        }
    }

    /// Build a policy from header names such as `["RS256"]`
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let all = Self::rsa_all();
        let allowed = names
            .into_iter()
            .map(|name| AlgorithmType::parse(name.as_ref().trim(), &all))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::ConfigurationInvalid(e.to_string()))?;

        if allowed.is_empty() {
            return Err(Error::ConfigurationInvalid(
                "at least one algorithm must be allowed".into(),
            ));
        }
        Ok(Self::allow_only(allowed))
    }

    pub(crate) fn validate(&self, algorithm: &AlgorithmType) -> Result<()> {
        if self.allowed.contains(algorithm) {
            Ok(())
        } else {
            Err(self.rejection(algorithm.as_str()))
        }
    }

    fn rejection(&self, found: &str) -> Error {
        Error::UnsupportedAlgorithm {
            found: found.into(),
            allowed: self.allowed.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self::rs256_only()
    }
}

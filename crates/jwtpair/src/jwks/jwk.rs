//! JWK (JSON Web Key) struct and conversion

use crate::algorithm::AlgorithmType;
use crate::error::{Error, KeyError, Result};
use crate::limits::{MAX_ALG_LENGTH, MAX_JWK_E_SIZE, MAX_JWK_N_SIZE, MAX_KID_LENGTH};
use crate::utils::base64url;
use miniserde::Deserialize;

fn malformed(message: impl Into<String>) -> Error {
    Error::KeyResolution(KeyError::Malformed(message.into()))
}

/// JSON Web Key (JWK) structure
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Jwk {
    /// Key type, "RSA" for every key this crate can use
    pub kty: Option<String>,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm (advisory per RFC 7517)
    pub alg: Option<String>,
    /// Key use, "sig" when present
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// RSA modulus (Base64URL-encoded)
    pub n: Option<String>,
    /// RSA exponent (Base64URL-encoded)
    pub e: Option<String>,
}

/// Check a JWK `alg` member against the token algorithm
///
/// The member is advisory: when present it must agree with the token algorithm, when absent
/// the token header is authoritative.
pub(crate) fn check_algorithm(jwk_alg: Option<&str>, algorithm: &AlgorithmType) -> Result<()> {
    match jwk_alg {
        Some(jwk_alg) if jwk_alg != algorithm.as_str() => Err(malformed(format!(
            "jwks: key algorithm '{jwk_alg}' doesn't match token algorithm '{algorithm}'"
        ))),
        _ => Ok(()),
    }
}

impl Jwk {
    /// Convert the JWK to a DER SubjectPublicKeyInfo usable with `algorithm`
    pub(crate) fn to_key(&self, algorithm: &AlgorithmType) -> Result<Vec<u8>> {
        let key = self.public_key_der()?;
        check_algorithm(self.alg.as_deref(), algorithm)?;
        Ok(key)
    }

    /// Convert the JWK to a DER SubjectPublicKeyInfo, ignoring its `alg` member
    pub(crate) fn public_key_der(&self) -> Result<Vec<u8>> {
        self.validate_structure()?;
        self.to_rsa_key()
    }

    fn validate_structure(&self) -> Result<()> {
        match self.kty.as_deref() {
            Some("RSA") => {}
            Some(kty) => {
                return Err(malformed(format!(
                    "jwks: key type mismatch: expected RSA, found {kty}"
                )));
            }
            None => return Err(malformed("jwks: missing key type (kty)")),
        }

        if let Some(use_val) = &self.key_use {
            if use_val != "sig" {
                return Err(malformed(format!(
                    "jwks: key use mismatch: expected 'sig', found '{use_val}'"
                )));
            }
        }

        for (field, value, max) in [
            ("alg", &self.alg, MAX_ALG_LENGTH),
            ("kid", &self.kid, MAX_KID_LENGTH),
            ("n", &self.n, MAX_JWK_N_SIZE),
            ("e", &self.e, MAX_JWK_E_SIZE),
        ] {
            if let Some(value) = value {
                if value.len() > max {
                    return Err(malformed(format!(
                        "jwks: field '{field}' too large: {} bytes (maximum: {max} bytes)",
                        value.len()
                    )));
                }
            }
        }

        Ok(())
    }

    fn to_rsa_key(&self) -> Result<Vec<u8>> {
        // Base64URL: 4 chars -> 3 bytes
        const MAX_DECODED_JWK_N: usize = (MAX_JWK_N_SIZE * 3) / 4;
        const MAX_DECODED_JWK_E: usize = (MAX_JWK_E_SIZE * 3) / 4;

        let n = self
            .n
            .as_deref()
            .ok_or_else(|| malformed("jwks: rsa key missing n (modulus)"))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| malformed("jwks: rsa key missing e (exponent)"))?;

        let n_bytes = base64url::decode_bytes(n, MAX_DECODED_JWK_N)
            .map_err(|err| malformed(format!("jwks: failed to decode n: {err}")))?;
        let e_bytes = base64url::decode_bytes(e, MAX_DECODED_JWK_E)
            .map_err(|err| malformed(format!("jwks: failed to decode e: {err}")))?;

        crate::utils::der::rsa_spki_from_n_e(&n_bytes, &e_bytes)
    }
}

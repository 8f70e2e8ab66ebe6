use crate::algorithm::AlgorithmType;
use crate::error::{Error, Result};
use crate::limits::{MAX_DECODED_HEADER_SIZE, MAX_KID_LENGTH};
use crate::utils::base64url;
use miniserde::Deserialize;
use miniserde::json::{Object, Value};

/// Token header
///
/// Represents the header containing algorithm and key ID.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenHeader {
    /// Algorithm used for signing
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// Key ID (for key set selection)
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
}

impl TokenHeader {
    /// Decode and parse a header segment
    pub(crate) fn decode(segment: &str) -> Result<Self> {
        let json = base64url::decode_string(segment, MAX_DECODED_HEADER_SIZE)?;
        let header: TokenHeader = miniserde::json::from_str(&json)
            .map_err(|e| Error::MalformedToken(format!("Failed to parse header: {e}")))?;

        if let Some(kid) = &header.key_id {
            if kid.len() > MAX_KID_LENGTH {
                return Err(Error::MalformedToken(format!(
                    "Header field 'kid' too long: {} bytes (maximum: {MAX_KID_LENGTH} bytes)",
                    kid.len()
                )));
            }
        }

        Ok(header)
    }
}

/// Build the header for a locally signed token: `{alg, kid, typ: "JWT"}`
pub(crate) fn signing_header(algorithm: AlgorithmType, key_id: &str) -> Object {
    let mut header = Object::new();
    header.insert("typ".into(), Value::String("JWT".into()));
    header.insert("alg".into(), Value::String(algorithm.as_str().into()));
    header.insert("kid".into(), Value::String(key_id.into()));
    header
}

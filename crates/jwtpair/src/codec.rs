//! Compact token encoding
//!
//! A compact token is `b64(header) "." b64(payload) "." b64(signature)` where every segment is
//! unpadded Base64URL. Header and payload maps serialize with sorted keys, so the same map
//! always yields the same signing input.

use crate::claims::Claims;
use crate::error::{Error, Result};
use crate::limits::{MAX_DECODED_PAYLOAD_SIZE, MAX_TOKEN_LENGTH};
use crate::utils::base64url;
use miniserde::json::Object;

/// Encode bytes as one unpadded Base64URL segment
pub fn encode_segment(bytes: impl AsRef<[u8]>) -> String {
    base64url::encode(bytes)
}

/// Decode one Base64URL segment, padded or not
///
/// # Errors
/// `MalformedSegment` when the input holds characters outside the URL-safe alphabet.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    base64url::decode_bytes(segment, MAX_DECODED_PAYLOAD_SIZE)
}

/// Build the signing input `b64(header).b64(payload)`
pub fn serialize(header: &Object, payload: &Object) -> String {
    let header = encode_segment(miniserde::json::to_string(header));
    let payload = encode_segment(miniserde::json::to_string(payload));
    format!("{header}.{payload}")
}

/// Append the signature segment to a signing input
pub fn assemble(signing_input: &str, signature: &[u8]) -> String {
    format!("{signing_input}.{}", encode_segment(signature))
}

/// Split a compact token into header, payload and signature segments
///
/// # Errors
/// `MalformedToken` unless there are exactly three segments, whatever the token's size.
/// `TokenTooLarge` for a well-shaped token above 64KB.
pub fn split_compact(token: &str) -> Result<(&str, &str, &str)> {
    let mut parts = token.split('.');
    let (header, payload, signature) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) => (header, payload, signature),
            _ => {
                return Err(Error::MalformedToken(format!(
                    "expected 3 segments separated by '.', found {}",
                    token.split('.').count()
                )));
            }
        };

    if token.len() > MAX_TOKEN_LENGTH {
        return Err(Error::TokenTooLarge {
            size: token.len(),
            max: MAX_TOKEN_LENGTH,
        });
    }

    Ok((header, payload, signature))
}

/// Read the `exp` claim from a token without verifying it
pub fn extract_expiry(token: &str) -> Result<i64> {
    let (_, payload, _) = split_compact(token)?;
    let claims = decode_payload(payload)
        .map_err(|e| Error::MalformedToken(format!("unreadable payload: {e}")))?;
    claims
        .expiration()
        .ok_or_else(|| Error::MalformedToken("payload has no integer 'exp' claim".into()))
}

pub(crate) fn decode_payload(segment: &str) -> Result<Claims> {
    let json = base64url::decode_string(segment, MAX_DECODED_PAYLOAD_SIZE)?;
    Claims::from_json(&json)
}

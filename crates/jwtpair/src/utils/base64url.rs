//! Base64URL encoding/decoding per RFC 4648
//!
//! Segments are written without padding. Decoding accepts padded and unpadded input so that
//! tokens produced by other signers still parse.

use crate::error::{Error, Result};
use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded Base64URL
pub(crate) fn encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(input)
}

/// Decode a Base64URL string to bytes with maximum size limit
pub(crate) fn decode_bytes(input: &str, max_size: usize) -> Result<Vec<u8>> {
    // Base64 expands by 4/3, reject before allocating
    if input.len() / 4 * 3 > max_size + 3 {
        return Err(Error::MalformedSegment(format!(
            "Encoded size exceeds limit: {} characters (max decoded: {max_size})",
            input.len()
        )));
    }

    let result = URL_SAFE_LENIENT
        .decode(input)
        .map_err(|e| Error::MalformedSegment(format!("Base64URL decode failed: {e}")))?;

    if result.len() > max_size {
        return Err(Error::MalformedSegment(format!(
            "Decoded size exceeds limit: {} bytes (max: {max_size})",
            result.len()
        )));
    }

    Ok(result)
}

/// Decode a Base64URL string to a UTF-8 string with size limit
pub(crate) fn decode_string(input: &str, max_size: usize) -> Result<String> {
    decode_bytes(input, max_size).and_then(|bytes| {
        String::from_utf8(bytes).map_err(|e| Error::MalformedSegment(format!("Invalid UTF-8: {e}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_strips_padding() {
        assert_eq!(encode(b"Hello"), "SGVsbG8");
        assert_eq!(encode(b"Hi"), "SGk");
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn test_encode_uses_url_safe_alphabet() {
        assert_eq!(encode([0xfb, 0xff]), "-_8");
    }

    #[test]
    fn test_decode_invalid() {
        assert!(matches!(
            decode_bytes("!!!", 1000),
            Err(Error::MalformedSegment(_))
        ));
        // Standard alphabet characters are outside the URL-safe alphabet
        assert!(decode_bytes("+/8", 1000).is_err());
    }

    #[test]
    fn test_decode_padded_and_unpadded() {
        assert_eq!(decode_bytes("SGVsbG8", 1000).unwrap(), b"Hello");
        assert_eq!(decode_bytes("SGVsbG8=", 1000).unwrap(), b"Hello");
        assert_eq!(decode_bytes("-_8", 1000).unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_with_limit() {
        assert_eq!(decode_bytes("SGVsbG8", 10).unwrap(), b"Hello");
        assert!(decode_bytes("SGVsbG8", 3).is_err());
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_bytes("", 1000).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_string("SGVsbG8", 10).unwrap(), "Hello");
        assert!(decode_string(&encode([0xff, 0xfe]), 10).is_err());
    }
}

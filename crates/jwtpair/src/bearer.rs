//! `Authorization: Bearer <token>` header parsing

use crate::error::{Error, Result};

/// Token carried by an `Authorization` header value
///
/// The scheme is matched case-insensitively. Anything but a single non-empty token after it is
/// rejected before the token ever reaches a verifier.
pub fn extract_token(header: &str) -> Result<&str> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(Error::InvalidAuthorizationHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(Error::InvalidAuthorizationHeader);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(Error::InvalidAuthorizationHeader);
    }
    Ok(token)
}

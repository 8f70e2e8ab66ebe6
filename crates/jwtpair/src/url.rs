//! Endpoint URL validation
//!
//! Every remote endpoint (key set, signing service, metadata server) is checked once when it
//! is configured, so malformed or oversized URLs fail at startup rather than per request.

use crate::error::{Error, Result};
use crate::limits::MAX_ENDPOINT_URL_LENGTH;

/// Validate an endpoint URL: non-empty, bounded, http(s) with a host
pub(crate) fn validate_endpoint_url(url: &str, name: &str) -> Result<url::Url> {
    if url.trim().is_empty() {
        return Err(Error::ConfigurationInvalid(format!("{name} cannot be empty")));
    }

    if url.len() > MAX_ENDPOINT_URL_LENGTH {
        return Err(Error::ConfigurationInvalid(format!(
            "{name} too long: {} characters (maximum: {MAX_ENDPOINT_URL_LENGTH} characters)",
            url.len()
        )));
    }

    let parsed = url
        .parse::<url::Url>()
        .map_err(|e| Error::ConfigurationInvalid(format!("invalid {name}: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::ConfigurationInvalid(format!(
            "{name} must use http or https scheme"
        )));
    }

    if parsed.host_str().is_none() {
        return Err(Error::ConfigurationInvalid(format!(
            "{name} must have a valid host"
        )));
    }

    Ok(parsed)
}

/// Base URL without a trailing slash, ready for path joining by `format!`
pub(crate) fn endpoint_base(url: &str, name: &str) -> Result<String> {
    validate_endpoint_url(url, name)?;
    Ok(url.trim_end_matches('/').to_string())
}

//! Bounded HTTP reads shared by the key set, signing and metadata clients

use std::fmt;

/// Transport-level failure, mapped by each caller onto its own error kind
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HttpError {
    Network(String),
    Status(u16),
    TooLarge { size: usize, max: usize },
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Network(msg) => write!(f, "network: {msg}"),
            HttpError::Status(status) => write!(f, "http: status {status}"),
            HttpError::TooLarge { size, max } => {
                write!(f, "response too large: {size} bytes (maximum: {max} bytes)")
            }
        }
    }
}

/// Send `request` and read a successful response body of at most `max_size` bytes
pub(crate) async fn read_limited(
    request: reqwest::RequestBuilder,
    max_size: usize,
) -> Result<Vec<u8>, HttpError> {
    let response = request
        .send()
        .await
        .map_err(|e| HttpError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(HttpError::Status(response.status().as_u16()));
    }

    if let Some(length) = response.content_length() {
        if length > max_size as u64 {
            return Err(HttpError::TooLarge {
                size: usize::try_from(length).unwrap_or(usize::MAX),
                max: max_size,
            });
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| HttpError::Network(e.to_string()))?;

    if bytes.len() > max_size {
        return Err(HttpError::TooLarge {
            size: bytes.len(),
            max: max_size,
        });
    }

    Ok(bytes.to_vec())
}

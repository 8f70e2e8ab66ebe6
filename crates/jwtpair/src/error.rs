//! Errors for jwtpair

use thiserror::Error;

/// Who is responsible for a failure
///
/// Callers map `Client` failures to 4xx responses and `System` failures to 5xx
/// responses. System failures are logged with their root cause and never echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Bad token, bad credentials or a malformed request
    Client,
    /// Signing, key fetch or configuration failure
    System,
}

/// jwtpair Errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Token too large: {size} bytes (maximum: {max} bytes)")]
    TokenTooLarge { size: usize, max: usize },

    // ============================================================================
    // Format Errors
    // ============================================================================
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Malformed segment: {0}")]
    MalformedSegment(String),

    // ============================================================================
    // Verification Errors
    // ============================================================================
    #[error("Algorithm '{found}' not allowed. Allowed: {allowed:?}")]
    UnsupportedAlgorithm { found: String, allowed: Vec<String> },

    #[error("Key resolution failed: {0}")]
    KeyResolution(KeyError),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Claim validation failed: {0}")]
    ClaimValidation(#[from] ClaimError),

    // ============================================================================
    // Issuance Errors
    // ============================================================================
    #[error("Claim '{0}' is reserved and set by the issuer")]
    ReservedClaim(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Token issuance failed: {0}")]
    Issuance(Box<Error>),

    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authorization header is not a bearer token")]
    InvalidAuthorizationHeader,

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

/// Reasons a token's claims were rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClaimError {
    #[error("issuer mismatch: expected '{expected}', found {found:?}")]
    IssuerMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("audience mismatch: expected '{expected}', found {found:?}")]
    AudienceMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("token expired at {expired_at} (now: {now})")]
    Expired { expired_at: i64, now: i64 },

    #[error("required claim '{0}' is missing")]
    Missing(String),
}

/// Reasons a verification key could not be resolved
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyError {
    /// The key set endpoint could not be reached or answered with an error status
    #[error("key set unreachable: {0}")]
    Unreachable(String),

    /// The key set was fetched but holds no key for the token
    #[error("no matching key: {0}")]
    NotFound(String),

    /// The key set or one of its keys could not be decoded
    #[error("malformed key material: {0}")]
    Malformed(String),
}

impl Error {
    /// Classify the failure as the caller's fault or the system's fault
    pub fn fault(&self) -> Fault {
        match self {
            Error::KeyResolution(KeyError::NotFound(_)) => Fault::Client,
            Error::KeyResolution(_)
            | Error::Signing(_)
            | Error::Issuance(_)
            | Error::ConfigurationInvalid(_) => Fault::System,
            _ => Fault::Client,
        }
    }

    /// HTTP status a request layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            _ if self.fault() == Fault::System => 500,
            Error::InvalidGrant(_) | Error::InvalidAuthorizationHeader => 400,
            _ => 401,
        }
    }

    /// OAuth error code safe to return to the caller
    ///
    /// System failures collapse to `internal_error` so that key material and remote error
    /// bodies never leave the process.
    pub fn oauth_code(&self) -> &'static str {
        match self {
            _ if self.fault() == Fault::System => "internal_error",
            Error::InvalidGrant(_) => "invalid_grant",
            Error::InvalidAuthorizationHeader => "invalid_authorization_header",
            _ => "unauthorized",
        }
    }
}

/// Result type alias for jwtpair operations
pub type Result<T> = std::result::Result<T, Error>;

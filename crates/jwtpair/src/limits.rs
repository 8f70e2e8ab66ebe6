//! Size limit constants for input validation

/// Maximum length for a compact token string (64KB)
pub(crate) const MAX_TOKEN_LENGTH: usize = 64 * 1024;

/// Maximum length for JWKS and signing endpoint URLs (2048 characters)
pub(crate) const MAX_ENDPOINT_URL_LENGTH: usize = 2048;

/// Maximum size for a JWKS response (512KB)
pub(crate) const MAX_JWKS_RESPONSE_SIZE: usize = 512 * 1024;

/// Maximum number of keys in a JWK set
pub(crate) const MAX_JWK_SET_SIZE: usize = 100;

/// Maximum size for a remote signing or metadata response (64KB)
pub(crate) const MAX_REMOTE_RESPONSE_SIZE: usize = 64 * 1024;

// ============================================================================
// Decoded segment limits
// ============================================================================

/// Maximum size for decoded header JSON (8KB)
pub(crate) const MAX_DECODED_HEADER_SIZE: usize = 8 * 1024;

/// Maximum size for decoded payload JSON (64KB)
pub(crate) const MAX_DECODED_PAYLOAD_SIZE: usize = 64 * 1024;

/// Maximum size for decoded signature bytes (1KB)
/// RSA signatures are 256-512 bytes for 2048-4096 bit keys
pub(crate) const MAX_DECODED_SIGNATURE_SIZE: usize = 1024;

// ============================================================================
// JWK field limits
// ============================================================================

/// Maximum size for the Base64URL-encoded RSA modulus (n) field (12KB)
pub(crate) const MAX_JWK_N_SIZE: usize = 12 * 1024;

/// Maximum size for the Base64URL-encoded RSA exponent (e) field
pub(crate) const MAX_JWK_E_SIZE: usize = 64;

/// Maximum size for key identifiers in headers and JWKs
pub(crate) const MAX_KID_LENGTH: usize = 256;

/// Maximum length for the algorithm (alg) field
pub(crate) const MAX_ALG_LENGTH: usize = 16;

/// Maximum RSA modulus size in bytes (65536 bits)
pub(crate) const MAX_RSA_MODULUS_SIZE: usize = 8192;

//! A minimal RS256 token issuer and verifier pair.
//!
//! The [`Issuer`] side authenticates a password grant and mints a compact signed token, either
//! with a local service account key or through a remote signing endpoint. The
//! [`TokenVerifier`] side checks bearer tokens against a static key or a cached remote JWKS.

mod error;
mod jwks;

// Internal modules
pub(crate) mod algorithm;
pub(crate) mod claims;
pub(crate) mod header;
pub(crate) mod http;
pub(crate) mod issuer;
pub(crate) mod keys;
pub(crate) mod url;
pub(crate) mod utils;
pub(crate) mod verifier;

pub mod bearer;
pub mod codec;
pub mod config;
pub mod grant;

// Public Interface
pub use algorithm::{AlgorithmPolicy, AlgorithmType};
pub use claims::{Claims, ClaimsValidation, RESERVED_CLAIMS};
pub use config::{IssuerConfig, RemoteEndpoints, SigningConfig, VerifierConfig};
pub use error::{ClaimError, Error, Fault, KeyError, Result};
pub use grant::{
    CredentialStore, InMemoryCredentialStore, TokenRequest, TokenResponse, UserRecord,
    password_grant,
};
pub use issuer::{IssuedToken, Issuer};
pub use jwks::RemoteKeySet;
pub use keys::{LocalSigner, MetadataClient, RemoteSigner, Signer};
pub use verifier::TokenVerifier;

/// JSON values used for claims
pub use miniserde::json;

pub(crate) mod limits;

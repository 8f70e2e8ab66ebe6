//! Shared fixtures: RSA test keys, service account key files and JWKS documents

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jwtpair::{Issuer, LocalSigner};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use serde_json::json;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub const ISSUER: &str = "token-signer@simple-api.iam.gserviceaccount.com";
pub const AUDIENCE: &str = "simple_api";
pub const KID: &str = "4f6c9a1e0b2d";
pub const ROTATED_KID: &str = "8d21e7c3aa90";

fn generate() -> RsaPrivateKey {
    RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("Failed to generate key")
}

/// Signing key published as [`KID`]
pub fn primary_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(generate)
}

/// Signing key published as [`ROTATED_KID`]
pub fn rotated_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(generate)
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Service account key file JSON for `key`
pub fn key_file_json(kid: &str, key: &RsaPrivateKey) -> String {
    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("Failed to serialize to PKCS#8");
    json!({
        "type": "service_account",
        "project_id": "simple-api",
        "private_key_id": kid,
        "private_key": pem.as_str(),
        "client_email": ISSUER,
        "client_id": "104209852136412387723",
    })
    .to_string()
}

/// Key file on disk, removed when the handle drops
pub fn key_file(kid: &str, key: &RsaPrivateKey) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create key file");
    file.write_all(key_file_json(kid, key).as_bytes())
        .expect("Failed to write key file");
    file
}

pub fn local_signer(kid: &str, key: &RsaPrivateKey) -> LocalSigner {
    LocalSigner::from_json(&key_file_json(kid, key)).expect("Failed to load signer")
}

pub fn local_issuer(kid: &str, key: &RsaPrivateKey) -> Issuer {
    Issuer::new(local_signer(kid, key), AUDIENCE, 3600).expect("Failed to build issuer")
}

/// JWK for the public half of `key`
pub fn jwk(kid: &str, key: &RsaPrivateKey) -> serde_json::Value {
    json!({
        "kty": "RSA",
        "alg": "RS256",
        "use": "sig",
        "kid": kid,
        "n": URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
        "e": URL_SAFE_NO_PAD.encode(key.e().to_bytes_be()),
    })
}

pub fn jwks(keys: &[(&str, &RsaPrivateKey)]) -> String {
    let keys: Vec<_> = keys.iter().map(|(kid, key)| jwk(kid, key)).collect();
    json!({ "keys": keys }).to_string()
}

/// Flip bits in the last decoded signature byte
pub fn corrupt_signature(token: &str) -> String {
    let (signing_input, signature) = token.rsplit_once('.').expect("compact token");
    let mut bytes = URL_SAFE_NO_PAD.decode(signature).expect("signature segment");
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Re-encode the payload with `edit` applied, keeping the original signature
pub fn edit_payload(token: &str, edit: impl FnOnce(&mut serde_json::Value)) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    let mut payload: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).expect("payload segment"))
            .expect("payload json");
    edit(&mut payload);
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{payload}.{}", parts[0], parts[2])
}

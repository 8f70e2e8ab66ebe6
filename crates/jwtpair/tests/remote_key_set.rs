//! Verification against a JWKS endpoint served by mockito

mod common;

use common::{AUDIENCE, ISSUER, KID, ROTATED_KID, primary_key, rotated_key};
use jwtpair::json::{Object, Value};
use jwtpair::{
    ClaimsValidation, Error, Fault, KeyError, RemoteKeySet, TokenVerifier, VerifierConfig,
};

fn subject(sub: &str) -> Object {
    let mut claims = Object::new();
    claims.insert("sub".into(), Value::String(sub.into()));
    claims
}

async fn jwks_server(body: String, hits: usize) -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jwks.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await;
    (server, mock)
}

fn verifier(server: &mockito::ServerGuard) -> TokenVerifier {
    let config = VerifierConfig::from_lookup(|name| match name {
        "SERVICE_ACCOUNT_ISSUER" => Some(ISSUER.to_string()),
        "JWKS_URI" => Some(format!("{}/jwks.json", server.url())),
        _ => None,
    })
    .unwrap();
    TokenVerifier::from_config(&config, reqwest::Client::new()).unwrap()
}

#[tokio::test]
async fn test_verify_with_remote_key_set() {
    let (server, mock) = jwks_server(common::jwks(&[(KID, primary_key())]), 1).await;
    let token = common::local_issuer(KID, primary_key())
        .issue(subject("user-1"))
        .await
        .unwrap()
        .access_token;

    let verifier = verifier(&server);
    for _ in 0..3 {
        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims.subject(), Some("user-1"));
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rotated_kid_costs_one_fetch() {
    let (server, mock) = jwks_server(
        common::jwks(&[(KID, primary_key()), (ROTATED_KID, rotated_key())]),
        1,
    )
    .await;

    let rotated = common::local_issuer(ROTATED_KID, rotated_key())
        .issue(subject("user-2"))
        .await
        .unwrap()
        .access_token;
    let primary = common::local_issuer(KID, primary_key())
        .issue(subject("user-1"))
        .await
        .unwrap()
        .access_token;

    // Clones share the key cache
    let verifier = verifier(&server);
    let clone = verifier.clone();

    assert!(verifier.verify(&rotated).await.is_ok());
    assert!(clone.verify(&primary).await.is_ok());
    assert!(clone.verify(&rotated).await.is_ok());
    mock.assert_async().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cold_verifications() {
    const VERIFICATIONS: usize = 8;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jwks.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(common::jwks(&[(KID, primary_key()), (ROTATED_KID, rotated_key())]))
        .expect_at_least(1)
        .expect_at_most(VERIFICATIONS)
        .create_async()
        .await;

    let primary = common::local_issuer(KID, primary_key())
        .issue(subject("user-1"))
        .await
        .unwrap()
        .access_token;
    let rotated = common::local_issuer(ROTATED_KID, rotated_key())
        .issue(subject("user-2"))
        .await
        .unwrap()
        .access_token;

    let verifier = verifier(&server);
    let tasks: Vec<_> = (0..VERIFICATIONS)
        .map(|i| {
            let verifier = verifier.clone();
            let token = if i % 2 == 0 { primary.clone() } else { rotated.clone() };
            tokio::spawn(async move { verifier.verify(&token).await })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_kid() {
    let (server, mock) = jwks_server(common::jwks(&[(KID, primary_key())]), 1).await;
    let token = common::local_issuer(ROTATED_KID, rotated_key())
        .issue(subject("user-2"))
        .await
        .unwrap()
        .access_token;

    let err = verifier(&server).verify(&token).await.unwrap_err();
    assert!(matches!(err, Error::KeyResolution(KeyError::NotFound(_))));
    assert_eq!(err.fault(), Fault::Client);
    assert_eq!(err.oauth_code(), "unauthorized");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_token_never_fetches_keys() {
    let (server, mock) = jwks_server(common::jwks(&[(KID, primary_key())]), 0).await;
    let verifier = verifier(&server);

    assert!(matches!(
        verifier.verify("only.two").await,
        Err(Error::MalformedToken(_))
    ));
    assert!(matches!(
        verifier.verify("eyJhbGciOiJIUzI1NiJ9.e30.c2ln").await,
        Err(Error::UnsupportedAlgorithm { .. })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_key_set_unreachable_is_system_fault() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/jwks.json")
        .with_status(503)
        .create_async()
        .await;
    let token = common::local_issuer(KID, primary_key())
        .issue(subject("user-1"))
        .await
        .unwrap()
        .access_token;

    let key_set = RemoteKeySet::new(
        reqwest::Client::new(),
        format!("{}/jwks.json", server.url()),
    )
    .unwrap();
    let verifier = TokenVerifier::new()
        .expect_claims(ClaimsValidation::new(ISSUER, AUDIENCE))
        .key_set(key_set)
        .build()
        .unwrap();

    let err = verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, Error::KeyResolution(KeyError::Unreachable(_))));
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.oauth_code(), "internal_error");
}

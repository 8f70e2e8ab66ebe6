//! Authorization server and resource server in one process
//!
//! Run with
//!
//! ```not_rust
//! SIGNING_SERVICE_ACCOUNT_KEY_PATH=./key.json cargo run --example servers
//! ```
//!
//! Then fetch a token and call the API:
//!
//! ```not_rust
//! curl -s -d 'grant_type=password&username=alice&password=strongP%40s%24w0rd' localhost:8000/token
//! curl -s -H "Authorization: Bearer $TOKEN" localhost:8001/api/v1/games
//! ```
//!
//! Without a key file, tokens are signed remotely as `SIGNING_SERVICE_ACCOUNT` (or the metadata
//! server's default account) and verified against the JWKS Google publishes for that account.

use std::future::IntoFuture;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jwtpair::{
    ClaimsValidation, CredentialStore, Error, Fault, InMemoryCredentialStore, Issuer,
    IssuerConfig, Signer, TokenRequest, TokenVerifier, VerifierConfig, bearer, password_grant,
};
use miniserde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AuthState {
    issuer: Issuer,
    store: Arc<dyn CredentialStore>,
}

#[derive(Clone)]
struct ApiState {
    verifier: TokenVerifier,
}

#[derive(Serialize)]
struct Game {
    name: String,
    platform: String,
    timespend: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,jwtpair=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = reqwest::Client::new();
    let issuer = Issuer::from_config(&IssuerConfig::from_env()?, client.clone()).await?;
    let verifier = verifier_for(&issuer, client)?;

    let auth = Router::new()
        .route("/token", post(token))
        .with_state(AuthState {
            issuer,
            store: Arc::new(InMemoryCredentialStore::demo()),
        });
    let api = Router::new()
        .route("/api/v1/games", get(games))
        .with_state(ApiState { verifier });

    let auth_listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
    let api_listener = tokio::net::TcpListener::bind("127.0.0.1:8001").await?;
    tracing::debug!("authorization server on {}", auth_listener.local_addr()?);
    tracing::debug!("resource server on {}", api_listener.local_addr()?);

    tokio::try_join!(
        axum::serve(auth_listener, auth).into_future(),
        axum::serve(api_listener, api).into_future(),
    )?;
    Ok(())
}

/// Verify with the local public key when signing locally, otherwise with the configured JWKS
fn verifier_for(issuer: &Issuer, client: reqwest::Client) -> jwtpair::Result<TokenVerifier> {
    let config = VerifierConfig::from_env_or_issuer(issuer.identity())?;

    match issuer.signer() {
        Signer::Local(signer) if std::env::var("JWKS_URI").is_err() => TokenVerifier::new()
            .algorithms(config.algorithms.clone())
            .expect_claims(ClaimsValidation::new(issuer.identity(), issuer.audience()))
            .key(&signer.public_key_der())
            .build(),
        _ => TokenVerifier::from_config(&config, client),
    }
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn error_response(err: &Error) -> Response {
    match err.fault() {
        Fault::System => tracing::error!(error = %err, "request failed"),
        Fault::Client => tracing::warn!(error = %err, "request rejected"),
    }
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = jwtpair::json::Object::new();
    body.insert(
        "error".into(),
        jwtpair::json::Value::String(err.oauth_code().into()),
    );
    json_response(status, jwtpair::json::to_string(&body))
}

async fn token(State(state): State<AuthState>, body: String) -> Response {
    let request = match TokenRequest::from_form(&body) {
        Ok(request) => request,
        Err(err) => return error_response(&err),
    };

    match password_grant(&state.issuer, state.store.as_ref(), &request).await {
        Ok(response) => json_response(StatusCode::OK, response.to_json()),
        Err(err) => error_response(&err),
    }
}

async fn games(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let token = match bearer::extract_token(authorization) {
        Ok(token) => token,
        Err(err) => return error_response(&err),
    };

    let claims = match state.verifier.verify(token).await {
        Ok(claims) => claims,
        Err(err) => return error_response(&err),
    };
    tracing::info!(
        user_id = claims.subject(),
        role = claims.role(),
        "authorized request"
    );

    let games = vec![
        Game {
            name: "Call of Duty: Modern Warfare II".into(),
            platform: "PS5".into(),
            timespend: 8000,
        },
        Game {
            name: "Grand Theft Auto V".into(),
            platform: "PS4".into(),
            timespend: 100,
        },
    ];
    json_response(StatusCode::OK, miniserde::json::to_string(&games))
}

//! Signing through the IAM credentials `signJwt` endpoint
//!
//! No private key is held in process. The payload is posted to the signing endpoint on behalf
//! of a service account and the endpoint returns the finished compact token, header and `kid`
//! included.

use crate::claims::Claims;
use crate::codec;
use crate::error::{Error, Result};
use crate::http::read_limited;
use crate::keys::metadata::MetadataClient;
use crate::limits::MAX_REMOTE_RESPONSE_SIZE;
use crate::url::endpoint_base;
use miniserde::json::{Object, Value};
use miniserde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct SignJwtResponse {
    #[serde(rename = "keyId")]
    key_id: Option<String>,
    #[serde(rename = "signedJwt")]
    signed_jwt: String,
}

/// Signer backed by a remote signing endpoint
#[derive(Clone, Debug)]
pub struct RemoteSigner {
    client: reqwest::Client,
    iam_base: String,
    account: String,
    metadata: MetadataClient,
}

impl RemoteSigner {
    /// Signer acting as `account`, authenticated with tokens from `metadata`
    ///
    /// `iam_base` is the credentials API root, e.g. `https://iamcredentials.googleapis.com/v1`.
    pub fn new(
        client: reqwest::Client,
        iam_base: &str,
        account: impl Into<String>,
        metadata: MetadataClient,
    ) -> Result<Self> {
        let account = account.into();
        if account.trim().is_empty() || account.contains('/') {
            return Err(Error::ConfigurationInvalid(format!(
                "invalid signing service account '{account}'"
            )));
        }
        Ok(Self {
            client,
            iam_base: endpoint_base(iam_base, "IAM credentials URL")?,
            account,
            metadata,
        })
    }

    /// Service account the endpoint signs as, used as the token issuer
    pub fn identity(&self) -> &str {
        &self.account
    }

    /// Compact token for `claims`, signed remotely
    ///
    /// # Errors
    /// `Signing` on any transport, authentication or response failure. Nothing is retried.
    pub async fn sign_claims(&self, claims: &Claims) -> Result<String> {
        let access_token = self.metadata.access_token().await?;

        let mut body = Object::new();
        body.insert("payload".into(), Value::String(claims.to_json()));

        let url = format!(
            "{}/projects/-/serviceAccounts/{}:signJwt",
            self.iam_base, self.account
        );
        let request = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(miniserde::json::to_string(&body));

        let bytes = read_limited(request, MAX_REMOTE_RESPONSE_SIZE)
            .await
            .map_err(|e| Error::Signing(format!("signJwt: {e}")))?;
        let bytes = std::str::from_utf8(&bytes)
            .map_err(|_| Error::Signing("signJwt: response is not utf-8".into()))?;
        let response: SignJwtResponse = miniserde::json::from_str(bytes)
            .map_err(|_| Error::Signing("signJwt: response has no signedJwt".into()))?;

        codec::split_compact(&response.signed_jwt)
            .map_err(|e| Error::Signing(format!("signJwt: unusable token: {e}")))?;

        debug!(
            account = %self.account,
            key_id = response.key_id.as_deref(),
            "token signed remotely"
        );
        Ok(response.signed_jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const ACCOUNT: &str = "signer@project.iam.gserviceaccount.com";
    const SIGN_PATH: &str =
        "/v1/projects/-/serviceAccounts/signer@project.iam.gserviceaccount.com:signJwt";

    async fn signer(server: &mut mockito::Server) -> (RemoteSigner, mockito::Mock) {
        let token = server
            .mock("GET", "/computeMetadata/v1/instance/service-accounts/default/token")
            .with_status(200)
            .with_body(r#"{"access_token":"ya29.token","expires_in":3599}"#)
            .create_async()
            .await;
        let client = reqwest::Client::new();
        let metadata = MetadataClient::new(client.clone(), &server.url()).unwrap();
        let signer =
            RemoteSigner::new(client, &format!("{}/v1", server.url()), ACCOUNT, metadata).unwrap();
        (signer, token)
    }

    #[test]
    fn test_new_rejects_bad_account() {
        let client = reqwest::Client::new();
        let metadata = MetadataClient::new(client.clone(), "http://127.0.0.1:9").unwrap();
        assert!(matches!(
            RemoteSigner::new(client, "http://127.0.0.1:9/v1", "", metadata),
            Err(Error::ConfigurationInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_claims() {
        let mut server = mockito::Server::new_async().await;
        let (signer, _token) = signer(&mut server).await;
        let claims = Claims::standard(ACCOUNT, "simple_api", 1_700_000_000, 3600).unwrap();

        let sign = server
            .mock("POST", SIGN_PATH)
            .match_header("authorization", "Bearer ya29.token")
            .match_body(Matcher::JsonString(
                serde_json::json!({ "payload": claims.to_json() }).to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"keyId":"remote-kid","signedJwt":"aGVhZGVy.cGF5bG9hZA.c2ln"}"#)
            .expect(1)
            .create_async()
            .await;

        let token = signer.sign_claims(&claims).await.unwrap();
        assert_eq!(token, "aGVhZGVy.cGF5bG9hZA.c2ln");
        sign.assert_async().await;
    }

    #[tokio::test]
    async fn test_remote_failure_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let (signer, _token) = signer(&mut server).await;
        let claims = Claims::standard(ACCOUNT, "simple_api", 1_700_000_000, 3600).unwrap();

        let sign = server
            .mock("POST", SIGN_PATH)
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        assert!(matches!(
            signer.sign_claims(&claims).await,
            Err(Error::Signing(msg)) if msg.contains("503")
        ));
        sign.assert_async().await;
    }

    #[tokio::test]
    async fn test_unusable_response() {
        let mut server = mockito::Server::new_async().await;
        let (signer, _token) = signer(&mut server).await;
        let claims = Claims::standard(ACCOUNT, "simple_api", 1_700_000_000, 3600).unwrap();

        let _sign = server
            .mock("POST", SIGN_PATH)
            .with_status(200)
            .with_body(r#"{"signedJwt":"not-a-token"}"#)
            .create_async()
            .await;

        assert!(matches!(
            signer.sign_claims(&claims).await,
            Err(Error::Signing(msg)) if msg.contains("unusable token")
        ));
    }
}

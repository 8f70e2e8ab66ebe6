//! Key material: where issued tokens get signed
pub(crate) mod local;
pub(crate) mod metadata;
pub(crate) mod remote;

use crate::claims::Claims;
use crate::config::{RemoteEndpoints, SigningConfig};
use crate::error::Result;
use tracing::info;

pub use local::LocalSigner;
pub use metadata::MetadataClient;
pub use remote::RemoteSigner;

/// Signing mode, chosen once at startup
#[derive(Debug, Clone)]
pub enum Signer {
    Local(LocalSigner),
    Remote(RemoteSigner),
}

impl Signer {
    /// Build the signer `config` selects
    ///
    /// Remote signing without an explicit account asks the metadata server which account the
    /// process runs as.
    pub async fn from_config(
        config: &SigningConfig,
        endpoints: &RemoteEndpoints,
        client: reqwest::Client,
    ) -> Result<Self> {
        match config {
            SigningConfig::LocalKey { path } => {
                let signer = LocalSigner::from_file(path)?;
                info!(key_id = signer.key_id(), identity = signer.identity(), "signing locally");
                Ok(Signer::Local(signer))
            }
            SigningConfig::Remote { account } => {
                let metadata = MetadataClient::new(client.clone(), &endpoints.metadata_server)?;
                let account = match account {
                    Some(account) => account.clone(),
                    None => metadata.service_account_email().await?,
                };
                info!(identity = %account, "signing remotely");
                let signer =
                    RemoteSigner::new(client, &endpoints.iam_credentials, account, metadata)?;
                Ok(Signer::Remote(signer))
            }
        }
    }

    /// Service account the tokens are issued by
    pub fn identity(&self) -> &str {
        match self {
            Signer::Local(signer) => signer.identity(),
            Signer::Remote(signer) => signer.identity(),
        }
    }

    /// Compact token for `claims`
    pub async fn sign_claims(&self, claims: &Claims) -> Result<String> {
        match self {
            Signer::Local(signer) => signer.sign_claims(claims),
            Signer::Remote(signer) => signer.sign_claims(claims).await,
        }
    }
}

impl From<LocalSigner> for Signer {
    fn from(signer: LocalSigner) -> Self {
        Signer::Local(signer)
    }
}

impl From<RemoteSigner> for Signer {
    fn from(signer: RemoteSigner) -> Self {
        Signer::Remote(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_remote_account_from_metadata() {
        let mut server = mockito::Server::new_async().await;
        let email = server
            .mock("GET", "/computeMetadata/v1/instance/service-accounts/default/email")
            .with_status(200)
            .with_body("default@project.iam.gserviceaccount.com")
            .expect(1)
            .create_async()
            .await;

        let endpoints = RemoteEndpoints {
            iam_credentials: format!("{}/v1", server.url()),
            metadata_server: server.url(),
        };
        let signer = Signer::from_config(
            &SigningConfig::Remote { account: None },
            &endpoints,
            reqwest::Client::new(),
        )
        .await
        .unwrap();

        assert!(matches!(signer, Signer::Remote(_)));
        assert_eq!(signer.identity(), "default@project.iam.gserviceaccount.com");
        email.assert_async().await;
    }

    #[tokio::test]
    async fn test_explicit_account_skips_metadata() {
        let signer = Signer::from_config(
            &SigningConfig::Remote {
                account: Some("signer@example.com".into()),
            },
            &RemoteEndpoints::default(),
            reqwest::Client::new(),
        )
        .await
        .unwrap();
        assert_eq!(signer.identity(), "signer@example.com");
    }

    #[tokio::test]
    async fn test_missing_key_file() {
        let result = Signer::from_config(
            &SigningConfig::LocalKey {
                path: "/nonexistent/key.json".into(),
            },
            &RemoteEndpoints::default(),
            reqwest::Client::new(),
        )
        .await;
        assert!(matches!(result, Err(Error::Signing(_))));
    }
}

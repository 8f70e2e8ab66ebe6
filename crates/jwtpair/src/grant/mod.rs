//! Resource owner password grant
pub(crate) mod store;

use crate::error::{Error, Result};
use crate::issuer::{IssuedToken, Issuer};
use miniserde::Serialize;
use miniserde::json::{Object, Value};
use tracing::debug;

pub use store::{CredentialStore, InMemoryCredentialStore, UserRecord};

pub const PASSWORD_GRANT_TYPE: &str = "password";

/// Form fields of a token request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: String,
    pub username: String,
    pub password: String,
    pub scope: Option<String>,
}

impl TokenRequest {
    /// Parse an `application/x-www-form-urlencoded` request body
    ///
    /// # Errors
    /// `InvalidGrant` when `grant_type`, `username` or `password` is missing.
    pub fn from_form(body: &str) -> Result<Self> {
        let mut grant_type = None;
        let mut username = None;
        let mut password = None;
        let mut scope = None;

        for (name, value) in url::form_urlencoded::parse(body.as_bytes()) {
            let slot = match name.as_ref() {
                "grant_type" => &mut grant_type,
                "username" => &mut username,
                "password" => &mut password,
                "scope" => &mut scope,
                _ => continue,
            };
            slot.get_or_insert_with(|| value.into_owned());
        }

        let required = |value: Option<String>, name: &str| {
            value.ok_or_else(|| Error::InvalidGrant(format!("missing form field '{name}'")))
        };

        Ok(Self {
            grant_type: required(grant_type, "grant_type")?,
            username: required(username, "username")?,
            password: required(password, "password")?,
            scope: scope.filter(|scope| !scope.is_empty()),
        })
    }
}

/// Successful token endpoint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn to_json(&self) -> String {
        miniserde::json::to_string(self)
    }
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            access_token: issued.access_token,
            token_type: "bearer".to_string(),
            expires_in: issued.expires_in,
        }
    }
}

/// Exchange resource owner credentials for a token
///
/// The grant type is checked before the store is consulted. Issued tokens carry the user id as
/// `sub` and the user's `role`.
pub async fn password_grant(
    issuer: &Issuer,
    store: &dyn CredentialStore,
    request: &TokenRequest,
) -> Result<TokenResponse> {
    if request.grant_type != PASSWORD_GRANT_TYPE {
        return Err(Error::InvalidGrant(format!(
            "unsupported grant_type '{}'",
            request.grant_type
        )));
    }

    let user = store
        .lookup(&request.username, &request.password)
        .ok_or(Error::InvalidCredentials)?;
    debug!(user_id = %user.id, role = %user.role, "credentials accepted");

    let mut claims = Object::new();
    claims.insert("sub".into(), Value::String(user.id));
    claims.insert("role".into(), Value::String(user.role));

    Ok(issuer.issue(claims).await?.into())
}

//! Google credential files and the OAuth token exchange.
//!
//! The credential file is read once at startup. Two file types are accepted:
//! `service_account` keys (signed JWT bearer grant) and `authorized_user`
//! files as written by `gcloud auth application-default login` (refresh-token
//! grant). Either one yields a bearer token for the storage session.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.full_control";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Reads and parses the credential file. Any failure here is fatal for the run.
pub fn load_credentials<P: AsRef<Path>>(path: P) -> Result<Credentials> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, path = ?path, "Failed to read credentials file");
        anyhow::anyhow!("Failed to read credentials file {:?}: {}", path, e)
    })?;
    let credentials: Credentials = serde_json::from_str(&raw).map_err(|e| {
        error!(error = ?e, path = ?path, "Failed to parse credentials file");
        anyhow::anyhow!("Failed to parse credentials file {:?}: {e}", path)
    })?;
    info!(path = ?path, kind = credentials.kind(), "Loaded credentials");
    Ok(credentials)
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::ServiceAccount(_) => "service_account",
            Credentials::AuthorizedUser(_) => "authorized_user",
        }
    }

    /// Exchanges the credentials for a bearer token with full storage control.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String> {
        let (token_uri, form): (&str, Vec<(&str, String)>) = match self {
            Credentials::ServiceAccount(key) => {
                let assertion = key.signed_assertion(chrono::Utc::now().timestamp())?;
                (
                    key.token_uri.as_str(),
                    vec![
                        ("grant_type", JWT_BEARER_GRANT.to_string()),
                        ("assertion", assertion),
                    ],
                )
            }
            Credentials::AuthorizedUser(user) => (
                DEFAULT_TOKEN_URI,
                vec![
                    ("grant_type", "refresh_token".to_string()),
                    ("client_id", user.client_id.clone()),
                    ("client_secret", user.client_secret.clone()),
                    ("refresh_token", user.refresh_token.clone()),
                ],
            ),
        };

        let response = client
            .post(token_uri)
            .form(&form)
            .send()
            .await
            .context("Token request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Token endpoint rejected credentials");
            anyhow::bail!("Token endpoint answered {status}: {body}");
        }
        let token: TokenResponse = response
            .json()
            .await
            .context("Token response was not valid JSON")?;
        info!(kind = self.kind(), expires_in = ?token.expires_in, "Obtained access token");
        Ok(token.access_token)
    }
}

impl ServiceAccountKey {
    /// RS256-signed assertion valid for one hour from `now`.
    pub fn signed_assertion(&self, now: i64) -> Result<String> {
        let claims = Claims {
            iss: &self.client_email,
            scope: STORAGE_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .context("Service account private key is not a valid RSA PEM")?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .context("Failed to sign service account assertion")
    }
}

//! Ambient credentials for the Sheets API.
//!
//! The job never mints tokens from key material. It either reads a ready-made
//! OAuth access token from the environment, or asks the metadata server of the
//! Google runtime it is deployed on for the default service account's token.

use super::PublishError;
use serde::Deserialize;
use std::fmt;

pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// OAuth bearer token. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Where the bearer token comes from.
#[derive(Debug, Clone)]
pub enum Credentials {
    Static(AccessToken),
    MetadataServer { url: String },
}

impl Credentials {
    /// Token from the environment when set, otherwise the metadata server.
    pub fn ambient() -> Self {
        match std::env::var(ACCESS_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Self::Static(AccessToken::new(token.trim())),
            _ => Self::MetadataServer {
                url: METADATA_TOKEN_URL.to_string(),
            },
        }
    }

    pub fn token(&self, client: &reqwest::blocking::Client) -> Result<AccessToken, PublishError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::MetadataServer { url } => {
                let resp = client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .map_err(|e| PublishError::Auth(format!("metadata server unreachable: {e}")))?;

                let status = resp.status();
                if !status.is_success() {
                    return Err(PublishError::Auth(format!(
                        "metadata server returned HTTP {status}"
                    )));
                }

                let token: MetadataToken = resp
                    .json()
                    .map_err(|e| PublishError::Auth(format!("malformed token response: {e}")))?;
                Ok(AccessToken::new(token.access_token))
            }
        }
    }
}

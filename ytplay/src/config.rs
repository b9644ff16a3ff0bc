//! Where `ytplay` keeps its files, and how it reads the OAuth client secrets.

use crate::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the OAuth client secret file inside the configuration directory.
pub const CLIENT_SECRETS_FILE: &str = "client_secret.json";

/// Name of the cached token file inside the configuration directory.
pub const TOKEN_FILE: &str = "token.json";

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Locations of the files `ytplay` reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// The OAuth client secret file downloaded from the Google Cloud console (input only).
    pub client_secrets: PathBuf,
    /// The cached OAuth token (read and written).
    pub token: PathBuf,
}

impl Paths {
    /// Uses `dir` for both the client secrets and the token.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            client_secrets: dir.join(CLIENT_SECRETS_FILE),
            token: dir.join(TOKEN_FILE),
        }
    }

    /// Resolves paths from (optional) command-line overrides.
    ///
    /// Without an explicit directory, the platform configuration directory is used
    /// (`~/.config/ytplay` on Linux).
    pub fn resolve(
        config_dir: Option<PathBuf>,
        client_secrets: Option<PathBuf>,
    ) -> eyre::Result<Self> {
        let dir = match config_dir {
            Some(dir) => dir,
            None => dirs::config_dir()
                .map(|dir| dir.join("ytplay"))
                .ok_or_else(|| {
                    Error::Config(
                        "cannot determine the user configuration directory; pass --config-dir"
                            .to_string(),
                    )
                })?,
        };
        let mut paths = Self::in_dir(dir);
        if let Some(client_secrets) = client_secrets {
            paths.client_secrets = client_secrets;
        }
        Ok(paths)
    }
}

/// OAuth client credentials for an installed (desktop) application.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// The top-level shape of the file the Google Cloud console hands out.
#[derive(Debug, Deserialize)]
enum ClientSecretsFile {
    #[serde(rename = "installed")]
    Installed(ClientSecrets),
    #[serde(rename = "web")]
    Web(ClientSecrets),
}

impl ClientSecrets {
    /// Parses the contents of a client secret file.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let file: ClientSecretsFile = serde_json::from_str(json).map_err(|e| {
            Error::Config(format!(
                "client secret file is not an OAuth client for an installed application: {e}"
            ))
        })?;
        let secrets = match file {
            ClientSecretsFile::Installed(secrets) => secrets,
            ClientSecretsFile::Web(secrets) => {
                tracing::debug!("using 'web' OAuth client credentials");
                secrets
            }
        };
        if secrets.client_id.trim().is_empty() {
            return Err(Error::Config("client secret file has an empty client_id".into()));
        }
        Ok(secrets)
    }

    /// Reads and parses the client secret file at `path`.
    pub async fn load(path: &Path) -> eyre::Result<Self> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::Config(format!(
                    "client secret file not found at {}; download an OAuth client for a \
                     desktop app from the Google Cloud console and save it there",
                    path.display()
                ))
                .into());
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "cannot read client secret file {}: {e}",
                    path.display()
                ))
                .into());
            }
        };
        let secrets = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            client_id = %secrets.client_id,
            "loaded client secrets"
        );
        Ok(secrets)
    }
}

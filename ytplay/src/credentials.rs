//! Acquiring, caching, and refreshing the user's OAuth credentials.

use crate::Error;
use crate::config::{ClientSecrets, Paths};
use crate::oauth::OAuthManager;
use crate::youtube_api::{TimeBoundAccessToken, YouTubeClient};
use eyre::Context;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// The cached token file.
///
/// Writes go through a temporary sibling file that is then renamed into place, so an
/// interrupted write never leaves a truncated token behind.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached token, if there is one.
    ///
    /// A token file that can't be parsed is treated as absent, which leads to a fresh consent
    /// flow rather than a hard failure.
    pub async fn load(&self) -> eyre::Result<Option<TimeBoundAccessToken>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&self.path, e)).context("read cached token"),
        };
        match serde_json::from_str(&json) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "ignoring unreadable cached token: {e}"
                );
                Ok(None)
            }
        }
    }

    pub async fn save(&self, token: &TimeBoundAccessToken) -> eyre::Result<()> {
        let json = serde_json::to_string_pretty(token).context("serialize token")?;

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::io(dir, e))
                .context("create configuration directory")?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        // a leftover from an interrupted save may have looser permissions
        match tokio::fs::remove_file(&tmp).await {
            Ok(()) => tracing::debug!(path = %tmp.display(), "removed stale temporary token"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&tmp, e)).context("remove stale temporary token"),
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(&tmp)
            .await
            .map_err(|e| Error::io(&tmp, e))
            .context("create token file")?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| Error::io(&tmp, e))
            .context("write token")?;
        file.sync_all()
            .await
            .map_err(|e| Error::io(&tmp, e))
            .context("flush token")?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::io(&self.path, e))
            .context("move token into place")?;

        tracing::debug!(path = %self.path.display(), "saved token");
        Ok(())
    }

    /// Deletes the cached token. Returns whether there was one.
    pub async fn remove(&self) -> eyre::Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(&self.path, e)).context("remove cached token"),
        }
    }
}

/// Produces an authenticated client, going through the consent flow if needed.
///
/// The client secret file is always read first, so a missing one fails before anything is
/// written. With `force_consent`, any cached token is ignored and replaced.
pub async fn connect(paths: &Paths, force_consent: bool) -> eyre::Result<YouTubeClient> {
    let secrets = ClientSecrets::load(&paths.client_secrets)
        .await
        .context("load OAuth client secrets")?;
    let oauth_manager = OAuthManager::new(secrets);
    let store = TokenStore::new(&paths.token);

    let cached = if force_consent {
        tracing::info!("forcing re-authentication");
        None
    } else {
        store.load().await?
    };

    let (token, changed) = match cached {
        Some(mut token) if token.is_expired() => {
            tracing::info!("refreshing expired YouTube credentials");
            if token
                .refresh(&oauth_manager)
                .await
                .context("refresh cached token")?
            {
                (token, true)
            } else {
                tracing::warn!(
                    "cached token could not be refreshed, getting new token via full OAuth"
                );
                (consent(&oauth_manager).await?, true)
            }
        }
        Some(token) => {
            tracing::debug!("using cached YouTube credentials");
            (token, false)
        }
        None => (consent(&oauth_manager).await?, true),
    };

    if changed {
        store.save(&token).await.context("cache YouTube token")?;
    }

    Ok(YouTubeClient::new(token, oauth_manager)?.with_token_store(store))
}

async fn consent(oauth_manager: &OAuthManager) -> eyre::Result<TimeBoundAccessToken> {
    let token = oauth_manager
        .authenticate()
        .await
        .context("authorize user to YouTube")?;
    Ok(TimeBoundAccessToken::new(token))
}

/// What [`status`] found out about the cached credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// There is no cached token.
    Missing,
    /// There is a cached token, but it can no longer be refreshed or is refused by the API.
    Rejected,
    /// The cached token works.
    Valid,
}

/// Checks the cached credentials without ever starting a consent flow.
///
/// Refreshes (and re-saves) the token if it has expired. A token that can no longer be
/// refreshed is deleted. `api_base` overrides where the validation request goes.
pub async fn status(paths: &Paths, api_base: Option<&str>) -> eyre::Result<CredentialState> {
    let store = TokenStore::new(&paths.token);
    let Some(mut token) = store.load().await? else {
        return Ok(CredentialState::Missing);
    };

    let secrets = ClientSecrets::load(&paths.client_secrets)
        .await
        .context("load OAuth client secrets")?;
    let oauth_manager = OAuthManager::new(secrets);

    if token.is_expired() {
        if !token
            .refresh(&oauth_manager)
            .await
            .context("refresh cached token")?
        {
            store.remove().await.context("discard rejected token")?;
            return Ok(CredentialState::Rejected);
        }
        store.save(&token).await.context("cache YouTube token")?;
    }

    let mut client = YouTubeClient::new(token, oauth_manager)?.with_token_store(store);
    if let Some(api_base) = api_base {
        client = client.with_api_base(api_base);
    }
    if client.validate_token().await? {
        Ok(CredentialState::Valid)
    } else {
        Ok(CredentialState::Rejected)
    }
}

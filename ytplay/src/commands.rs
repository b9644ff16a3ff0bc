//! The implementation of each `ytplay` subcommand.
//!
//! Every command validates its arguments before touching credentials or the network, then
//! composes the credential, API, sort and output layers, and hands its result to [`Output`].

use crate::Error;
use crate::config::Paths;
use crate::credentials::{self, TokenStore};
use crate::models::{
    CredentialReport, CredentialStatus, DeletionReport, PlaylistSummary, VideoListing,
};
use crate::output::Output;
use crate::playlist::{self, SortOptions};
use crate::progress::Progress;
use crate::youtube_api::YouTubeClient;
use eyre::Context as _;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: Paths,
    pub output: Output,
    pub progress: Progress,
    /// Send API requests here instead of the public YouTube endpoint.
    pub api_base: Option<String>,
}

impl Context {
    async fn client(&self) -> eyre::Result<YouTubeClient> {
        self.connect(false).await
    }

    async fn connect(&self, force_consent: bool) -> eyre::Result<YouTubeClient> {
        let client = credentials::connect(&self.paths, force_consent).await?;
        Ok(match &self.api_base {
            Some(api_base) => client.with_api_base(api_base),
            None => client,
        })
    }
}

/// Checks that a playlist id was given and isn't blank.
pub fn require_playlist_id(playlist_id: Option<String>) -> Result<String, Error> {
    match playlist_id {
        Some(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        Some(_) => Err(Error::Validation("playlist id must not be blank".into())),
        None => Err(Error::Validation("a playlist id is required".into())),
    }
}

/// Authorizes `ytplay` and caches the resulting token.
///
/// Reuses a cached token unless `force` is set. A cached token that YouTube rejects is
/// thrown away and replaced through the consent flow.
pub async fn login(ctx: &Context, mut force: bool) -> eyre::Result<()> {
    loop {
        let client = ctx.connect(force).await?;
        if client.validate_token().await? {
            break;
        }
        if force {
            return Err(Error::Auth("YouTube did not accept the new credentials".into()))
                .context("verify credentials");
        }
        tracing::warn!("cached credentials were rejected, authorizing again");
        TokenStore::new(&ctx.paths.token)
            .remove()
            .await
            .context("discard rejected token")?;
        force = true;
    }
    ctx.output
        .emit(&CredentialReport {
            token_path: ctx.paths.token.clone(),
            state: CredentialStatus::Authenticated,
        })
        .await
}

/// Forgets the cached token.
pub async fn logout(ctx: &Context) -> eyre::Result<()> {
    let store = TokenStore::new(&ctx.paths.token);
    if store.remove().await? {
        tracing::info!(path = %store.path().display(), "removed cached token");
    } else {
        tracing::info!("there was no cached token to remove");
    }
    ctx.output
        .emit(&CredentialReport {
            token_path: ctx.paths.token.clone(),
            state: CredentialStatus::LoggedOut,
        })
        .await
}

/// Reports whether usable credentials are cached, without ever asking for consent.
pub async fn status(ctx: &Context) -> eyre::Result<()> {
    let state = credentials::status(&ctx.paths, ctx.api_base.as_deref())
        .await
        .context("check cached credentials")?;
    ctx.output
        .emit(&CredentialReport {
            token_path: ctx.paths.token.clone(),
            state: state.into(),
        })
        .await
}

pub async fn list_playlists(ctx: &Context) -> eyre::Result<()> {
    let client = ctx.client().await?;
    let playlists = playlist::collect_playlists(&client, &ctx.progress).await?;
    ctx.output.emit(&playlists).await
}

pub async fn playlist_summary(ctx: &Context, playlist_id: Option<String>) -> eyre::Result<()> {
    let playlist_id = require_playlist_id(playlist_id)?;
    let client = ctx.client().await?;
    let playlist = client
        .get_playlist(&playlist_id)
        .await
        .context("look up playlist")?;
    ctx.output.emit(&PlaylistSummary::from(playlist)).await
}

/// Lists a playlist's videos, optionally with their durations and the total.
pub async fn list_videos(
    ctx: &Context,
    playlist_id: Option<String>,
    with_durations: bool,
) -> eyre::Result<()> {
    let playlist_id = require_playlist_id(playlist_id)?;
    let client = ctx.client().await?;
    let videos =
        playlist::collect_videos(&client, &playlist_id, with_durations, &ctx.progress).await?;
    let listing = if with_durations {
        VideoListing::with_durations(playlist_id, videos)
    } else {
        VideoListing::new(playlist_id, videos)
    };
    ctx.output.emit(&listing).await
}

pub async fn create_sorted_playlist(
    ctx: &Context,
    playlist_id: Option<String>,
    options: SortOptions,
) -> eyre::Result<()> {
    let playlist_id = require_playlist_id(playlist_id)?;
    let client = ctx.client().await?;
    let report =
        playlist::create_sorted_copy(&client, &playlist_id, options, &ctx.progress).await?;
    ctx.output.emit(&report).await
}

/// Deletes a playlist, asking for confirmation on the terminal unless `force` is set.
pub async fn delete_playlist(
    ctx: &Context,
    playlist_id: Option<String>,
    force: bool,
) -> eyre::Result<()> {
    let playlist_id = require_playlist_id(playlist_id)?;
    let client = ctx.client().await?;
    let playlist = client
        .get_playlist(&playlist_id)
        .await
        .context("look up playlist to delete")?;
    let title = playlist.snippet.title;

    let confirmed = force
        || confirm(&format!(
            "Delete playlist '{title}' ({playlist_id})? This cannot be undone."
        ))
        .await?;
    if confirmed {
        client
            .delete_playlist(&playlist_id)
            .await
            .context("delete playlist")?;
    } else {
        tracing::info!(playlist_id, "deletion cancelled");
    }

    ctx.output
        .emit(&DeletionReport {
            playlist_id,
            title,
            deleted: confirmed,
        })
        .await
}

/// Asks a yes/no question on stderr and reads the answer from stdin. Anything but yes is no.
async fn confirm(question: &str) -> eyre::Result<bool> {
    eprint!("{question} [y/N] ");
    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .map_err(|e| Error::io("<stdin>", e))
        .context("read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

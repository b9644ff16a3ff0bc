//! Playlist operations that take more than one API call.

use crate::models::{PlaylistSummary, SortedPlaylistReport, VideoEntry};
use crate::progress::Progress;
use crate::sort::{self, SortKey};
use crate::youtube_api::{PlaylistInsertRequest, PrivacyStatus, YouTubeClient};
use eyre::Context;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::instrument;

/// Delay between consecutive inserts into a new playlist.
///
/// The API starts answering with quota errors when items are added back to back.
const INSERT_PACING: Duration = Duration::from_millis(100);

/// Fetches all of the user's playlists.
pub async fn collect_playlists(
    client: &YouTubeClient,
    progress: &Progress,
) -> eyre::Result<Vec<PlaylistSummary>> {
    let counter = progress.counter("Fetching playlists");
    let mut stream = std::pin::pin!(client.list_my_playlists());
    let mut playlists = Vec::new();
    while let Some(playlist) = stream.next().await {
        playlists.push(PlaylistSummary::from(playlist.context("list playlists")?));
        counter.inc(1);
    }
    counter.finish_and_clear();
    tracing::info!(playlists = playlists.len(), "fetched playlists");
    Ok(playlists)
}

/// Fetches all videos of a playlist, in playlist order.
///
/// With `with_durations`, each video's duration is looked up as well. Videos the API has no
/// duration for keep `None`.
#[instrument(skip(client, progress))]
pub async fn collect_videos(
    client: &YouTubeClient,
    playlist_id: &str,
    with_durations: bool,
    progress: &Progress,
) -> eyre::Result<Vec<VideoEntry>> {
    let counter = progress.counter("Fetching videos");
    let mut stream = std::pin::pin!(client.list_playlist_items(playlist_id));
    let mut videos = Vec::new();
    while let Some(item) = stream.next().await {
        let item = item.with_context(|| format!("list videos of playlist {playlist_id}"))?;
        videos.push(VideoEntry::from(item));
        counter.inc(1);
    }
    counter.finish_and_clear();

    if with_durations && !videos.is_empty() {
        let ids: Vec<String> = videos.iter().map(|video| video.video_id.clone()).collect();
        let durations = client
            .video_durations(&ids)
            .await
            .context("look up video durations")?;
        for video in &mut videos {
            video.duration_seconds = durations.get(&video.video_id).copied();
        }
    }

    tracing::info!(videos = videos.len(), "fetched playlist videos");
    Ok(videos)
}

/// How [`create_sorted_copy`] orders and names the new playlist.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    pub key: SortKey,
    pub reverse: bool,
    /// Title of the new playlist; derived from the source playlist if not given.
    pub title: Option<String>,
    pub privacy: PrivacyStatus,
}

/// Creates a new playlist holding the videos of `source_id`, sorted.
///
/// Videos are inserted one at a time, in order. If an insert fails, the copy stops there and
/// the partially filled playlist is left in place; the error says how far it got.
#[instrument(skip(client, progress))]
pub async fn create_sorted_copy(
    client: &YouTubeClient,
    source_id: &str,
    options: SortOptions,
    progress: &Progress,
) -> eyre::Result<SortedPlaylistReport> {
    let source = client
        .get_playlist(source_id)
        .await
        .context("look up source playlist")?;
    let source_title = source.snippet.title;

    let videos = collect_videos(client, source_id, options.key.needs_durations(), progress).await?;
    if videos.is_empty() {
        eyre::bail!("playlist '{source_title}' ({source_id}) has no videos to sort");
    }
    let videos = sort::sorted(&videos, options.key, options.reverse);

    let title = options
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| default_title(&source_title, options.key, options.reverse));
    let request = PlaylistInsertRequest::new(
        &title,
        description(&source_title, options.key, options.reverse),
        options.privacy,
    );
    let playlist = client
        .create_playlist(&request)
        .await
        .context("create sorted playlist")?;
    tracing::info!(playlist_id = playlist.id, title, "created playlist");

    let bar = progress.bar(videos.len() as u64, "Adding videos");
    for (position, video) in videos.iter().enumerate() {
        if position > 0 {
            tokio::time::sleep(INSERT_PACING).await;
        }
        let position = u32::try_from(position).context("playlist position out of range")?;
        client
            .insert_playlist_item(&playlist.id, &video.video_id, Some(position))
            .await
            .with_context(|| {
                format!(
                    "add video {} to playlist {}; {position} of {} videos were added before \
                     this failure and the partial playlist was kept",
                    video.video_id,
                    playlist.id,
                    videos.len()
                )
            })?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(SortedPlaylistReport {
        source_playlist_id: source_id.to_string(),
        source_title,
        playlist_id: playlist.id,
        title,
        sort_by: options.key,
        reverse: options.reverse,
        privacy: options.privacy,
        video_count: videos.len(),
    })
}

fn direction(reverse: bool, short: bool) -> &'static str {
    match (reverse, short) {
        (false, true) => "asc",
        (true, true) => "desc",
        (false, false) => "ascending",
        (true, false) => "descending",
    }
}

fn default_title(source_title: &str, key: SortKey, reverse: bool) -> String {
    format!(
        "{source_title} (sorted by {key} {})",
        direction(reverse, true)
    )
}

fn description(source_title: &str, key: SortKey, reverse: bool) -> String {
    format!(
        "Sorted copy of '{source_title}' by {key} ({})",
        direction(reverse, false)
    )
}

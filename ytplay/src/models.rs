//! What `ytplay` reports back to the user.
//!
//! These are flattened views of the API resources, shaped for output: the same values are
//! rendered as text tables or serialized as JSON, and the JSON can be read back in.

use crate::credentials::CredentialState;
use crate::sort::SortKey;
use crate::youtube_api::{Playlist, PlaylistItem, PrivacyStatus};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One of the user's playlists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub item_count: u32,
    pub published_at: Timestamp,
    pub privacy: Option<PrivacyStatus>,
}

impl From<Playlist> for PlaylistSummary {
    fn from(playlist: Playlist) -> Self {
        Self {
            id: playlist.id,
            title: playlist.snippet.title,
            description: playlist.snippet.description,
            item_count: playlist
                .content_details
                .map(|details| details.item_count)
                .unwrap_or(0),
            published_at: playlist.snippet.published_at,
            privacy: playlist.status.map(|status| status.privacy_status),
        }
    }
}

/// One entry of a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    /// The playlist item, not the video.
    pub item_id: String,
    pub video_id: String,
    pub title: String,
    /// The channel that uploaded the video; absent for deleted and private videos.
    pub channel: Option<String>,
    /// Zero-based position in the playlist the entry was read from.
    pub position: u32,
    /// When the video was published, or else when it was added to the playlist.
    pub published_at: Option<Timestamp>,
    /// Only present when durations were looked up, and only for videos the API knows about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

impl From<PlaylistItem> for VideoEntry {
    fn from(item: PlaylistItem) -> Self {
        let video_published_at = item
            .content_details
            .as_ref()
            .and_then(|details| details.video_published_at);
        Self {
            item_id: item.id,
            video_id: item.snippet.resource_id.video_id,
            title: item.snippet.title,
            channel: item.snippet.video_owner_channel_title,
            position: item.snippet.position,
            published_at: video_published_at.or(item.snippet.published_at),
            duration_seconds: None,
        }
    }
}

impl VideoEntry {
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// The videos of one playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoListing {
    pub playlist_id: String,
    pub videos: Vec<VideoEntry>,
    /// Sum of all known durations; only present when durations were looked up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<u64>,
}

impl VideoListing {
    pub fn new(playlist_id: impl Into<String>, videos: Vec<VideoEntry>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            videos,
            total_duration_seconds: None,
        }
    }

    /// Like [`Self::new`], but also totals up the videos' durations.
    pub fn with_durations(playlist_id: impl Into<String>, videos: Vec<VideoEntry>) -> Self {
        let total: u64 = videos.iter().filter_map(|video| video.duration_seconds).sum();
        Self {
            playlist_id: playlist_id.into(),
            videos,
            total_duration_seconds: Some(total),
        }
    }
}

/// The outcome of `create-sorted-playlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedPlaylistReport {
    pub source_playlist_id: String,
    pub source_title: String,
    pub playlist_id: String,
    pub title: String,
    pub sort_by: SortKey,
    pub reverse: bool,
    pub privacy: PrivacyStatus,
    pub video_count: usize,
}

impl SortedPlaylistReport {
    pub fn url(&self) -> String {
        playlist_url(&self.playlist_id)
    }
}

/// The outcome of `delete-playlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub playlist_id: String,
    pub title: String,
    /// False if the user declined the confirmation prompt.
    pub deleted: bool,
}

/// The outcome of `login`, `logout`, and `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialReport {
    pub token_path: PathBuf,
    pub state: CredentialStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// Credentials are cached and accepted by the API.
    Authenticated,
    /// Credentials are cached but the API doesn't accept them.
    Rejected,
    /// No credentials are cached.
    LoggedOut,
}

impl From<CredentialState> for CredentialStatus {
    fn from(state: CredentialState) -> Self {
        match state {
            CredentialState::Missing => CredentialStatus::LoggedOut,
            CredentialState::Rejected => CredentialStatus::Rejected,
            CredentialState::Valid => CredentialStatus::Authenticated,
        }
    }
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={playlist_id}")
}

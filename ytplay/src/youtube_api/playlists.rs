//! YouTube Playlists API types.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Response structure for the `playlists.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistListResponse {
    /// Identifies the API resource's type.
    ///
    /// The value will be `youtube#playlistListResponse`.
    #[serde(default)]
    pub kind: String,
    /// A list of playlists that match the request criteria.
    #[serde(default)]
    pub items: VecDeque<Playlist>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next
    /// page in the result set.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `playlist` resource represents a YouTube playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    /// The ID that YouTube uses to uniquely identify the playlist.
    pub id: String,
    pub snippet: PlaylistSnippet,
    /// Only present when `contentDetails` was requested.
    #[serde(rename = "contentDetails", default)]
    pub content_details: Option<PlaylistContentDetails>,
    /// Only present when `status` was requested.
    #[serde(default)]
    pub status: Option<PlaylistStatus>,
}

/// Basic details about a playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// The date and time that the playlist was created.
    #[serde(rename = "publishedAt")]
    pub published_at: Timestamp,
    #[serde(rename = "channelTitle", default)]
    pub channel_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistContentDetails {
    /// The number of videos in the playlist.
    #[serde(rename = "itemCount")]
    pub item_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistStatus {
    #[serde(rename = "privacyStatus")]
    pub privacy_status: PrivacyStatus,
}

/// Who can see a playlist.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyStatus {
    #[default]
    Private,
    Public,
    Unlisted,
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrivacyStatus::Private => "private",
            PrivacyStatus::Public => "public",
            PrivacyStatus::Unlisted => "unlisted",
        })
    }
}

/// Request body for the `playlists.insert` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists/insert>
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistInsertRequest {
    pub snippet: PlaylistInsertSnippet,
    pub status: PlaylistInsertStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistInsertSnippet {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistInsertStatus {
    #[serde(rename = "privacyStatus")]
    pub privacy_status: PrivacyStatus,
}

impl PlaylistInsertRequest {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        privacy_status: PrivacyStatus,
    ) -> Self {
        Self {
            snippet: PlaylistInsertSnippet {
                title: title.into(),
                description: description.into(),
            },
            status: PlaylistInsertStatus { privacy_status },
        }
    }
}

//! YouTube PlaylistItems API types.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `playlistItems.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItemListResponse {
    /// The value will be `youtube#playlistItemListResponse`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub items: VecDeque<PlaylistItem>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `playlistItem` resource identifies a video included in a playlist.
///
/// The same video can appear in a playlist more than once, each time as a separate item with its
/// own ID.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// The ID that YouTube uses to uniquely identify the playlist item.
    pub id: String,
    pub snippet: PlaylistItemSnippet,
    #[serde(rename = "contentDetails", default)]
    pub content_details: Option<PlaylistItemContentDetails>,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItemSnippet {
    /// The date and time that the item was added to the playlist.
    #[serde(rename = "publishedAt")]
    pub published_at: Option<Timestamp>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "playlistId")]
    pub playlist_id: String,
    /// The item's zero-based position in the playlist.
    #[serde(default)]
    pub position: u32,
    /// The channel that owns the video.
    ///
    /// Missing for videos that have been deleted or made private.
    #[serde(rename = "videoOwnerChannelTitle", default)]
    pub video_owner_channel_title: Option<String>,
    #[serde(rename = "resourceId")]
    pub resource_id: ResourceId,
}

/// Identifies the resource a playlist item points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceId {
    /// Always `youtube#video` for playlist items.
    pub kind: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#contentDetails>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItemContentDetails {
    #[serde(rename = "videoId")]
    pub video_id: String,
    /// When the video itself was published to YouTube.
    #[serde(rename = "videoPublishedAt", default)]
    pub video_published_at: Option<Timestamp>,
}

/// Request body for the `playlistItems.insert` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems/insert>
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistItemInsertRequest {
    pub snippet: PlaylistItemInsertSnippet,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistItemInsertSnippet {
    #[serde(rename = "playlistId")]
    pub playlist_id: String,
    #[serde(rename = "resourceId")]
    pub resource_id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl PlaylistItemInsertRequest {
    pub fn new(playlist_id: &str, video_id: &str, position: Option<u32>) -> Self {
        Self {
            snippet: PlaylistItemInsertSnippet {
                playlist_id: playlist_id.to_string(),
                resource_id: ResourceId {
                    kind: "youtube#video".to_string(),
                    video_id: video_id.to_string(),
                },
                position,
            },
        }
    }
}

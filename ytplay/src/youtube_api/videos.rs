//! YouTube Videos API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `videos.list` API call.
///
/// Videos that no longer exist (or aren't visible to the caller) are silently left out of
/// `items`.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoListResponse {
    /// The value will be `youtube#videoListResponse`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub items: VecDeque<Video>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `video` resource represents a YouTube video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: String,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<VideoContentDetails>,
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#contentDetails>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoContentDetails {
    /// The length of the video as an ISO-8601 duration, e.g. `PT15M33S`.
    pub duration: String,
}

//! YouTube Data API v3 client library.
//!
//! Only the parts of the API that deal with playlists are covered:
//!
//! - [`playlists`]: the user's playlists (list, get, create, delete)
//! - [`playlist_items`]: the videos in a playlist (list, insert)
//! - [`videos`]: per-video details, of which we only use the duration
//!
//! All list endpoints are exposed as [`PagedStream`]s that follow continuation tokens lazily.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tokio_stream::StreamExt;
//! use ytplay::youtube_api::YouTubeClient;
//!
//! # async fn example(client: YouTubeClient) -> eyre::Result<()> {
//! let mut playlists = std::pin::pin!(client.list_my_playlists());
//! while let Some(playlist) = playlists.next().await {
//!     let playlist = playlist?;
//!     println!("{} ({})", playlist.snippet.title, playlist.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod playlist_items;
pub mod playlists;
pub mod types;
pub mod videos;

pub use client::{
    DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT, MAX_PAGE_SIZE, TimeBoundAccessToken, YouTubeClient,
};
pub use types::{Page, PageInfo, PagedStream};

pub use playlist_items::{PlaylistItem, PlaylistItemSnippet};
pub use playlists::{Playlist, PlaylistInsertRequest, PlaylistSnippet, PrivacyStatus};
pub use videos::{Video, VideoContentDetails};

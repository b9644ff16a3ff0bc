//! Core YouTube API client functionality and authentication management.

use crate::Error;
use crate::credentials::TokenStore;
use crate::duration;
use crate::error::remote_message;
use crate::oauth::OAuthManager;
use crate::youtube_api::{
    playlist_items::{PlaylistItem, PlaylistItemInsertRequest, PlaylistItemListResponse},
    playlists::{Playlist, PlaylistInsertRequest, PlaylistListResponse},
    types::{Page, PagedStream},
    videos::VideoListResponse,
};
use eyre::Context;
use http::{Method, StatusCode};
use jiff::{SignedDuration, Timestamp};
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_stream::Stream;
use tracing::instrument;

/// Where the YouTube Data API v3 lives.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// The most items any YouTube list endpoint hands out per page, and the most video ids
/// `videos.list` accepts in one call.
pub const MAX_PAGE_SIZE: usize = 50;

/// How long a single API request may take.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long before the advertised expiry we stop trusting an access token.
const EXPIRY_SAFETY_BUFFER_SECS: u64 = 300;

/// An OAuth token together with the point in time its access token stops being usable.
///
/// This is also the on-disk format of the cached token file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: Timestamp,
}

impl TimeBoundAccessToken {
    /// Wraps a token that is already expired, forcing a refresh before first use.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Timestamp::UNIX_EPOCH,
            token,
        }
    }

    /// Wraps a token that was just issued.
    ///
    /// The expiry time is calculated from the token's `expires_in` field minus
    /// a 5-minute safety buffer to prevent edge-case failures.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Timestamp::now() >= self.expires_at
    }

    pub fn access_token(&self) -> &str {
        self.token.access_token().secret()
    }

    /// Refreshes this token using the provided OAuth manager, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token was successfully refreshed
    /// * `Ok(false)` - Refresh failed (invalid grant, no refresh token, etc.)
    /// * `Err(_)` - Network or other error occurred
    pub async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match oauth_manager
            .refresh_token(&self.token)
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually doesn't send the refresh token again
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                } else {
                    tracing::debug!("new token includes refresh token");
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Uses the current time + expires_in duration - 5 minute safety buffer.
    /// If no expires_in is provided, assumes a conservative 55-minute lifetime.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> Timestamp {
        let lifetime = match token.expires_in() {
            Some(expires_in) => expires_in
                .as_secs()
                .saturating_sub(EXPIRY_SAFETY_BUFFER_SECS),
            None => 3300,
        };
        let lifetime = SignedDuration::from_secs(i64::try_from(lifetime).unwrap_or(i64::MAX));
        Timestamp::now()
            .checked_add(lifetime)
            .unwrap_or(Timestamp::MAX)
    }
}

/// Client for interacting with the YouTube Data API v3.
///
/// The client automatically refreshes expired access tokens before API calls using the stored
/// refresh token, and persists refreshed tokens to its [`TokenStore`] if it has one.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    oauth_manager: Arc<OAuthManager>,
    token_store: Option<TokenStore>,
    client: reqwest::Client,
    api_base: String,
    timeout: Duration,
}

impl YouTubeClient {
    pub fn new(token: TimeBoundAccessToken, oauth_manager: OAuthManager) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("build YouTube API HTTP client")?;
        Ok(Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager: Arc::new(oauth_manager),
            token_store: None,
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Gives up on any single request after `timeout` instead of [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends requests somewhere other than [`DEFAULT_API_BASE`].
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Saves the token to `store` whenever it gets refreshed, and deletes it from there once
    /// it can no longer be refreshed.
    pub fn with_token_store(mut self, store: TokenStore) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Returns a copy of the current token.
    pub async fn token(&self) -> TimeBoundAccessToken {
        self.token.lock().await.clone()
    }

    /// Gets a usable access token, refreshing first if it has expired (or if `force` is set).
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn fresh_access_token(&self, force: bool) -> eyre::Result<String> {
        let mut token = self.token.lock().await;

        if force || token.is_expired() {
            tracing::debug!(force, "refreshing access token");

            if !token.refresh(&self.oauth_manager).await? {
                tracing::error!("access token refresh failed, client is unusable");
                if let Some(store) = &self.token_store {
                    store.remove().await.context("discard rejected token")?;
                }
                return Err(Error::Auth(
                    "the cached credentials were rejected; run `ytplay login --force`".into(),
                )
                .into());
            }
            tracing::debug!("access token successfully refreshed");

            if let Some(store) = &self.token_store {
                store
                    .save(&token)
                    .await
                    .context("persist refreshed token")?;
            }
        }

        Ok(token.access_token().to_string())
    }

    /// Makes an authenticated HTTP request to the YouTube API with common error handling.
    ///
    /// - A connection failure is retried once. So are a timeout and a 5xx response, but only
    ///   for requests that are safe to repeat: a `POST` may already have taken effect.
    /// - A 401 forces one token refresh and is then retried once.
    /// - Any other non-2xx response becomes an [`Error::RemoteApi`] with the server's message.
    ///
    /// `path` is relative to the API base, e.g. `playlists`.
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    pub(crate) async fn make_authenticated_request(
        &self,
        method: Method,
        path: &str,
        query_params: &[(&str, &str)],
        json_body: Option<&(impl Serialize + Sync)>,
    ) -> eyre::Result<reqwest::Response> {
        let url = format!("{}/{}", self.api_base, path);
        let repeatable = matches!(method, Method::GET | Method::DELETE);
        let mut retried_transient = false;
        let mut refreshed = false;

        loop {
            let access_token = self.fresh_access_token(false).await?;

            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(access_token)
                .timeout(self.timeout)
                .query(query_params);
            if let Some(body) = json_body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e)
                    if !retried_transient
                        && (e.is_connect() || (repeatable && e.is_timeout())) =>
                {
                    tracing::warn!(%method, url, "transient network failure, retrying once: {e}");
                    retried_transient = true;
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("send {method} request to YouTube API: {url}")
                    });
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::UNAUTHORIZED && !refreshed {
                tracing::debug!(%method, url, "access token rejected, refreshing and retrying");
                refreshed = true;
                self.fresh_access_token(true).await?;
                continue;
            }
            if status.is_server_error() && repeatable && !retried_transient {
                tracing::warn!(%method, url, %status, "server error, retrying once");
                retried_transient = true;
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(%method, url, %status, "could not read error response: {e}");
                    String::new()
                }
            };
            return Err(Error::RemoteApi {
                status,
                message: remote_message(&body),
            })
            .with_context(|| format!("{method} {url}"));
        }
    }

    /// Checks that the token works by asking for (at most) one of the user's playlists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token is valid and can be used for API calls
    /// * `Ok(false)` - Token is invalid or refresh failed
    /// * `Err(_)` - Some other failure (network, server) occurred
    #[instrument(skip(self), ret)]
    pub async fn validate_token(&self) -> eyre::Result<bool> {
        match self.list_playlists_internal(1, None).await {
            Ok(_) => {
                tracing::debug!("YouTube API token validation successful");
                Ok(true)
            }
            Err(e) => {
                let rejected = match Error::find_in(&e) {
                    Some(Error::Auth(_)) => true,
                    Some(Error::RemoteApi { status, .. }) => {
                        *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
                    }
                    _ => false,
                };
                if rejected {
                    tracing::warn!("YouTube API token validation failed: {e:#}");
                    Ok(false)
                } else {
                    Err(e).context("validate YouTube token")
                }
            }
        }
    }

    /// Returns a paginated stream of all playlists owned by the authenticated user.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/list>
    #[instrument(skip(self))]
    pub fn list_my_playlists(&self) -> impl Stream<Item = eyre::Result<Playlist>> + use<'_> {
        PagedStream::new(|page_token| async {
            let response = self
                .list_playlists_internal(MAX_PAGE_SIZE, page_token)
                .await?;
            Ok(Page::new(response.items, response.next_page_token))
        })
    }

    /// Gets a single playlist (which need not be the user's own) by its ID.
    ///
    /// A playlist that doesn't exist is reported as a 404 [`Error::RemoteApi`], the same way
    /// the other playlist endpoints report it.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/list>
    #[instrument(skip(self))]
    pub async fn get_playlist(&self, playlist_id: &str) -> eyre::Result<Playlist> {
        let query_params = [
            ("part", "snippet,contentDetails,status"),
            ("id", playlist_id),
        ];

        let response = self
            .make_authenticated_request(Method::GET, "playlists", &query_params, None::<&()>)
            .await?;

        let playlists: PlaylistListResponse = response
            .json()
            .await
            .context("parse YouTube playlists API response as JSON")?;

        playlists.items.into_iter().next().ok_or_else(|| {
            Error::RemoteApi {
                status: StatusCode::NOT_FOUND,
                message: format!("playlist not found: {playlist_id}"),
            }
            .into()
        })
    }

    /// Returns a paginated stream of the items of a playlist, in playlist order.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/list>
    #[instrument(skip(self))]
    pub fn list_playlist_items<'a>(
        &'a self,
        playlist_id: &'a str,
    ) -> impl Stream<Item = eyre::Result<PlaylistItem>> + use<'a> {
        PagedStream::new(move |page_token| async move {
            let response = self
                .list_playlist_items_internal(playlist_id, MAX_PAGE_SIZE, page_token)
                .await?;
            Ok(Page::new(response.items, response.next_page_token))
        })
    }

    /// Looks up the duration, in seconds, of each of the given videos.
    ///
    /// Ids are sent in batches of [`MAX_PAGE_SIZE`]. Videos the API doesn't return (deleted or
    /// private ones), or whose duration can't be parsed, are absent from the returned map.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip(self, video_ids), fields(videos = video_ids.len()))]
    pub async fn video_durations(
        &self,
        video_ids: &[String],
    ) -> eyre::Result<HashMap<String, u64>> {
        let mut durations = HashMap::with_capacity(video_ids.len());

        for batch in video_ids.chunks(MAX_PAGE_SIZE) {
            let ids = batch.join(",");
            let query_params = [
                ("part", "contentDetails"),
                ("id", ids.as_str()),
                ("maxResults", "50"),
            ];

            let response = self
                .make_authenticated_request(Method::GET, "videos", &query_params, None::<&()>)
                .await?;

            let videos: VideoListResponse = response
                .json()
                .await
                .context("parse YouTube videos API response as JSON")?;

            tracing::debug!(
                requested = batch.len(),
                returned_items = videos.items.len(),
                "fetched video durations"
            );

            for video in videos.items {
                let Some(details) = video.content_details else {
                    continue;
                };
                match duration::parse_iso8601(&details.duration) {
                    Ok(seconds) => {
                        durations.insert(video.id, seconds);
                    }
                    Err(e) => {
                        tracing::warn!(
                            video_id = video.id,
                            "ignoring unparseable duration: {e:#}"
                        );
                    }
                }
            }
        }

        Ok(durations)
    }

    /// Creates a new playlist owned by the authenticated user.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/insert>
    #[instrument(skip(self), ret)]
    pub async fn create_playlist(
        &self,
        request: &PlaylistInsertRequest,
    ) -> eyre::Result<Playlist> {
        let query_params = [("part", "snippet,status")];

        let response = self
            .make_authenticated_request(Method::POST, "playlists", &query_params, Some(request))
            .await?;

        let playlist: Playlist = response
            .json()
            .await
            .context("parse YouTube API playlist insert response as JSON")?;

        tracing::debug!(playlist_id = playlist.id, "successfully created playlist");

        Ok(playlist)
    }

    /// Adds a video to a playlist, at `position` if given (otherwise at the end).
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/insert>
    #[instrument(skip(self))]
    pub async fn insert_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
        position: Option<u32>,
    ) -> eyre::Result<PlaylistItem> {
        let query_params = [("part", "snippet")];
        let request = PlaylistItemInsertRequest::new(playlist_id, video_id, position);

        let response = self
            .make_authenticated_request(
                Method::POST,
                "playlistItems",
                &query_params,
                Some(&request),
            )
            .await?;

        let item: PlaylistItem = response
            .json()
            .await
            .context("parse YouTube API playlist item insert response as JSON")?;

        tracing::trace!(playlist_id, video_id, item_id = item.id, "inserted playlist item");

        Ok(item)
    }

    /// Deletes a playlist. This cannot be undone.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/delete>
    #[instrument(skip(self))]
    pub async fn delete_playlist(&self, playlist_id: &str) -> eyre::Result<()> {
        let query_params = [("id", playlist_id)];

        self.make_authenticated_request(Method::DELETE, "playlists", &query_params, None::<&()>)
            .await?;

        tracing::debug!(playlist_id, "successfully deleted playlist");

        Ok(())
    }

    /// Internal method to call the `playlists.list` API with `mine=true`.
    ///
    /// Used by [`Self::list_my_playlists`] to handle pagination, and by
    /// [`Self::validate_token`] with `max_results = 1`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/list>
    async fn list_playlists_internal(
        &self,
        max_results: usize,
        page_token: Option<String>,
    ) -> eyre::Result<PlaylistListResponse> {
        let max_results_string = max_results.to_string();
        let mut query_params = vec![
            ("part", "snippet,contentDetails,status"),
            ("mine", "true"),
            ("maxResults", max_results_string.as_str()),
        ];

        if let Some(ref token) = page_token {
            query_params.push(("pageToken", token.as_str()));
        }

        let response = self
            .make_authenticated_request(Method::GET, "playlists", &query_params, None::<&()>)
            .await?;

        let playlists: PlaylistListResponse = response
            .json()
            .await
            .context("parse YouTube playlists API response as JSON")?;

        tracing::debug!(
            total_results = playlists.page_info.total_results,
            returned_items = playlists.items.len(),
            "fetched playlists"
        );

        Ok(playlists)
    }

    /// Internal method to call the `playlistItems.list` API for one page.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/list>
    async fn list_playlist_items_internal(
        &self,
        playlist_id: &str,
        max_results: usize,
        page_token: Option<String>,
    ) -> eyre::Result<PlaylistItemListResponse> {
        let max_results_string = max_results.to_string();
        let mut query_params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results_string.as_str()),
        ];

        if let Some(ref token) = page_token {
            query_params.push(("pageToken", token.as_str()));
        }

        let response = self
            .make_authenticated_request(Method::GET, "playlistItems", &query_params, None::<&()>)
            .await?;

        let items: PlaylistItemListResponse = response
            .json()
            .await
            .context("parse YouTube playlistItems API response as JSON")?;

        tracing::debug!(
            playlist_id,
            total_results = items.page_info.total_results,
            returned_items = items.items.len(),
            "fetched playlist items"
        );

        Ok(items)
    }
}

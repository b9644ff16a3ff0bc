//! Tests of the API client and the playlist operations against a mock YouTube server.

use http::StatusCode;
use oauth2::basic::{BasicTokenResponse, BasicTokenType};
use oauth2::{AccessToken, EmptyExtraTokenFields, RefreshToken, TokenResponse};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_stream::StreamExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use ytplay::Error;
use ytplay::config::{ClientSecrets, Paths};
use ytplay::credentials::{self, CredentialState, TokenStore};
use ytplay::oauth::OAuthManager;
use ytplay::playlist::{self, SortOptions};
use ytplay::progress::Progress;
use ytplay::sort::SortKey;
use ytplay::youtube_api::{
    PlaylistInsertRequest, PrivacyStatus, TimeBoundAccessToken, YouTubeClient,
};

fn token(access_token: &str) -> TimeBoundAccessToken {
    let mut raw = BasicTokenResponse::new(
        AccessToken::new(access_token.into()),
        BasicTokenType::Bearer,
        EmptyExtraTokenFields {},
    );
    raw.set_refresh_token(Some(RefreshToken::new("1//refresh".into())));
    raw.set_expires_in(Some(&Duration::from_secs(3599)));
    TimeBoundAccessToken::new(raw)
}

fn secrets(server: &MockServer) -> ClientSecrets {
    ClientSecrets {
        client_id: "client.apps.googleusercontent.com".into(),
        client_secret: "shh".into(),
        auth_uri: format!("{}/auth", server.uri()),
        token_uri: format!("{}/token", server.uri()),
    }
}

fn client(server: &MockServer) -> YouTubeClient {
    client_with_token(server, token("ya29.valid"))
}

fn client_with_token(server: &MockServer, token: TimeBoundAccessToken) -> YouTubeClient {
    YouTubeClient::new(token, OAuthManager::new(secrets(server)))
        .unwrap()
        .with_api_base(server.uri())
}

fn playlist_json(id: &str, title: &str) -> Value {
    json!({
        "kind": "youtube#playlist",
        "id": id,
        "snippet": {
            "publishedAt": "2023-05-01T10:00:00Z",
            "title": title,
            "description": "",
            "channelTitle": "Me"
        },
        "contentDetails": { "itemCount": 3 },
        "status": { "privacyStatus": "public" }
    })
}

fn item_json(playlist_id: &str, video_id: &str, position: u32) -> Value {
    json!({
        "kind": "youtube#playlistItem",
        "id": format!("item-{video_id}"),
        "snippet": {
            "publishedAt": "2024-01-01T00:00:00Z",
            "title": format!("Video {video_id}"),
            "description": "",
            "playlistId": playlist_id,
            "position": position,
            "videoOwnerChannelTitle": "Some channel",
            "resourceId": { "kind": "youtube#video", "videoId": video_id }
        },
        "contentDetails": {
            "videoId": video_id,
            "videoPublishedAt": "2023-01-01T00:00:00Z"
        }
    })
}

fn video_json(video_id: &str, duration: &str) -> Value {
    json!({
        "kind": "youtube#video",
        "id": video_id,
        "contentDetails": { "duration": duration }
    })
}

fn error_json(code: u16, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message,
            "errors": [{ "message": message, "domain": "youtube", "reason": "whatever" }]
        }
    })
}

fn write_client_secrets(paths: &Paths, server: &MockServer) {
    let secrets = secrets(server);
    std::fs::write(
        &paths.client_secrets,
        json!({
            "installed": {
                "client_id": secrets.client_id,
                "client_secret": secrets.client_secret,
                "auth_uri": secrets.auth_uri,
                "token_uri": secrets.token_uri,
                "redirect_uris": ["http://localhost"]
            }
        })
        .to_string(),
    )
    .unwrap();
}

async fn requests_to(server: &MockServer, verb: http::Method, to: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.method == verb && request.url.path() == to)
        .collect()
}

#[tokio::test]
async fn playlist_items_follow_continuation_tokens() {
    let server = MockServer::start().await;

    let first_page: Vec<Value> = (0..50)
        .map(|i| item_json("PL1", &format!("v{i}"), i))
        .collect();
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", "PL1"))
        .and(query_param("maxResults", "50"))
        .and(header("authorization", "Bearer ya29.valid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "youtube#playlistItemListResponse",
            "nextPageToken": "page2",
            "pageInfo": { "totalResults": 51, "resultsPerPage": 50 },
            "items": first_page
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("pageToken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "youtube#playlistItemListResponse",
            "pageInfo": { "totalResults": 51, "resultsPerPage": 50 },
            "items": [item_json("PL1", "v50", 50)]
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut stream = std::pin::pin!(client.list_playlist_items("PL1"));
    let mut ids = Vec::new();
    while let Some(item) = stream.next().await {
        ids.push(item.unwrap().snippet.resource_id.video_id);
    }

    let expected: Vec<String> = (0..51).map(|i| format!("v{i}")).collect();
    assert_eq!(ids, expected);
    assert_eq!(requests_to(&server, http::Method::GET, "/playlistItems").await.len(), 2);
}

#[tokio::test]
async fn my_playlists_are_listed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("mine", "true"))
        .and(query_param("part", "snippet,contentDetails,status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [playlist_json("PLa", "First"), playlist_json("PLb", "Second")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let playlists = playlist::collect_playlists(&client(&server), &Progress::hidden())
        .await
        .unwrap();

    let titles: Vec<_> = playlists.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["First", "Second"]);
    assert_eq!(playlists[0].item_count, 3);
    assert_eq!(playlists[0].privacy, Some(PrivacyStatus::Public));
}

#[tokio::test]
async fn my_playlists_follow_continuation_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("mine", "true"))
        .and(query_param("pageToken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [playlist_json("PLc", "Third")]
        })))
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("mine", "true"))
        .and(query_param("maxResults", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nextPageToken": "page2",
            "pageInfo": { "totalResults": 3, "resultsPerPage": 2 },
            "items": [playlist_json("PLa", "First"), playlist_json("PLb", "Second")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let playlists = playlist::collect_playlists(&client(&server), &Progress::hidden())
        .await
        .unwrap();

    let ids: Vec<_> = playlists.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["PLa", "PLb", "PLc"]);
}

/// Answers `videos.list` with a one minute duration for every requested id.
struct EchoDurations;

impl Respond for EchoDurations {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let ids = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, ids)| ids.into_owned())
            .unwrap_or_default();
        let items: Vec<Value> = ids
            .split(',')
            .filter(|id| !id.is_empty())
            .map(|id| video_json(id, "PT1M"))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "items": items }))
    }
}

#[tokio::test]
async fn durations_are_looked_up_in_batches_of_fifty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("part", "contentDetails"))
        .respond_with(EchoDurations)
        .mount(&server)
        .await;

    let ids: Vec<String> = (0..120).map(|i| format!("v{i}")).collect();
    let durations = client(&server).video_durations(&ids).await.unwrap();

    assert_eq!(durations.len(), 120);
    assert!(durations.values().all(|&seconds| seconds == 60));

    let requests = requests_to(&server, http::Method::GET, "/videos").await;
    let batch_sizes: Vec<usize> = requests
        .iter()
        .map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, ids)| ids.split(',').count())
                .unwrap()
        })
        .collect();
    assert_eq!(batch_sizes, [50, 50, 20]);
}

#[tokio::test]
async fn missing_and_malformed_durations_are_left_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                video_json("ok", "PT1H2M3S"),
                video_json("weird", "not a duration"),
                { "id": "no-details" }
            ]
        })))
        .mount(&server)
        .await;

    let ids = ["ok", "weird", "no-details", "deleted"].map(String::from);
    let durations = client(&server).video_durations(&ids).await.unwrap();

    assert_eq!(durations.len(), 1);
    assert_eq!(durations["ok"], 3723);
}

#[tokio::test]
async fn client_errors_carry_the_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("id", "PLforbidden"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(error_json(403, "The request is not properly authorized.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = client(&server)
        .get_playlist("PLforbidden")
        .await
        .unwrap_err();

    match Error::find_in(&report) {
        Some(Error::RemoteApi { status, message }) => {
            assert_eq!(*status, StatusCode::FORBIDDEN);
            assert_eq!(message, "The request is not properly authorized.");
        }
        other => panic!("expected a remote API error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_playlist_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("id", "PLgone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let report = client(&server).get_playlist("PLgone").await.unwrap_err();

    assert!(matches!(
        Error::find_in(&report),
        Some(Error::RemoteApi { status, .. }) if *status == StatusCode::NOT_FOUND
    ));
}

#[tokio::test]
async fn a_server_error_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [video_json("v1", "PT10S")] })),
        )
        .mount(&server)
        .await;

    let durations = client(&server)
        .video_durations(&["v1".to_string()])
        .await
        .unwrap();

    assert_eq!(durations["v1"], 10);
    assert_eq!(requests_to(&server, http::Method::GET, "/videos").await.len(), 2);
}

#[tokio::test]
async fn persistent_server_errors_give_up_after_one_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_json(500, "Backend Error")))
        .expect(2)
        .mount(&server)
        .await;

    let report = client(&server)
        .video_durations(&["v1".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(
        Error::find_in(&report),
        Some(Error::RemoteApi { status, message })
            if *status == StatusCode::INTERNAL_SERVER_ERROR && message == "Backend Error"
    ));
}

#[tokio::test]
async fn playlist_creation_is_not_repeated_after_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/playlists"))
        .respond_with(ResponseTemplate::new(503).set_body_json(error_json(503, "Backend Error")))
        .mount(&server)
        .await;

    let request = PlaylistInsertRequest::new("Sorted", "", PrivacyStatus::Private);
    let report = client(&server).create_playlist(&request).await.unwrap_err();

    assert!(matches!(
        Error::find_in(&report),
        Some(Error::RemoteApi { status, .. }) if *status == StatusCode::SERVICE_UNAVAILABLE
    ));
    assert_eq!(requests_to(&server, http::Method::POST, "/playlists").await.len(), 1);
}

#[tokio::test]
async fn a_timed_out_request_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [video_json("v1", "PT10S")] })),
        )
        .mount(&server)
        .await;

    let durations = client(&server)
        .with_timeout(Duration::from_millis(250))
        .video_durations(&["v1".to_string()])
        .await
        .unwrap();

    assert_eq!(durations["v1"], 10);
    assert_eq!(requests_to(&server, http::Method::GET, "/videos").await.len(), 2);
}

#[tokio::test]
async fn a_second_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let report = client(&server)
        .with_timeout(Duration::from_millis(250))
        .video_durations(&["v1".to_string()])
        .await
        .unwrap_err();

    assert!(Error::find_in(&report).is_none());
    assert!(
        format!("{report:#}").contains("send GET request to YouTube API"),
        "{report:#}"
    );
    assert_eq!(requests_to(&server, http::Method::GET, "/videos").await.len(), 2);
}

#[tokio::test]
async fn a_timed_out_insert_is_not_repeated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let result = client(&server)
        .with_timeout(Duration::from_millis(250))
        .insert_playlist_item("PLcopy", "v1", Some(0))
        .await;

    assert!(result.is_err());
    assert_eq!(requests_to(&server, http::Method::POST, "/playlistItems").await.len(), 1);
}

#[tokio::test]
async fn unreachable_servers_are_reported_after_one_retry() {
    // bind and release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let server = MockServer::start().await;
    let client = client(&server).with_api_base(format!("http://127.0.0.1:{port}"));

    let report = client.get_playlist("PL1").await.unwrap_err();

    assert!(
        format!("{report:#}").contains("send GET request to YouTube API"),
        "{report:#}"
    );
}

#[tokio::test]
async fn unauthorized_requests_refresh_the_token_and_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(header("authorization", "Bearer ya29.stale"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(error_json(401, "Invalid Credentials")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(header("authorization", "Bearer ya29.fresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [playlist_json("PL1", "One")] })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("token.json"));
    let client = client_with_token(&server, token("ya29.stale")).with_token_store(store.clone());

    let playlist = client.get_playlist("PL1").await.unwrap();
    assert_eq!(playlist.snippet.title, "One");

    // the refreshed token keeps the old refresh token, and is saved
    let saved = store.load().await.unwrap().unwrap();
    assert_eq!(saved.access_token(), "ya29.fresh");
    assert_eq!(
        saved.raw_token().refresh_token().map(|t| t.secret().as_str()),
        Some("1//refresh")
    );
    assert_eq!(client.token().await.access_token(), "ya29.fresh");
}

#[tokio::test]
async fn rejected_refresh_invalidates_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(error_json(401, "Invalid Credentials")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(!client.validate_token().await.unwrap());

    let report = client.get_playlist("PL1").await.unwrap_err();
    assert!(matches!(Error::find_in(&report), Some(Error::Auth(_))));
}

#[tokio::test]
async fn rejected_tokens_are_removed_from_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(error_json(401, "Invalid Credentials")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("token.json"));
    store.save(&token("ya29.revoked")).await.unwrap();
    let client = client_with_token(&server, token("ya29.revoked")).with_token_store(store.clone());

    assert!(!client.validate_token().await.unwrap());
    assert!(store.load().await.unwrap().is_none());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn expired_tokens_are_refreshed_before_use() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/playlists"))
        .and(query_param("id", "PLdoomed"))
        .and(header("authorization", "Bearer ya29.fresh"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let expired = TimeBoundAccessToken::expired(token("ya29.old").raw_token().clone());
    client_with_token(&server, expired)
        .delete_playlist("PLdoomed")
        .await
        .unwrap();
}

async fn mount_source_playlist(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("id", "PLsrc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [playlist_json("PLsrc", "Road trip")] })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", "PLsrc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                item_json("PLsrc", "medium", 0),
                item_json("PLsrc", "short", 1),
                item_json("PLsrc", "gone", 2),
                item_json("PLsrc", "long", 3)
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                video_json("medium", "PT5M"),
                video_json("short", "PT30S"),
                video_json("long", "PT1H")
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/playlists"))
        .and(query_param("part", "snippet,status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(playlist_json("PLsorted", "Road trip sorted")),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn sorted_copy_inserts_videos_in_sorted_order() {
    let server = MockServer::start().await;
    mount_source_playlist(&server).await;
    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(item_json("PLsorted", "whatever", 0)),
        )
        .expect(4)
        .mount(&server)
        .await;

    let report = playlist::create_sorted_copy(
        &client(&server),
        "PLsrc",
        SortOptions {
            key: SortKey::Duration,
            reverse: true,
            title: None,
            privacy: PrivacyStatus::Unlisted,
        },
        &Progress::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(report.playlist_id, "PLsorted");
    assert_eq!(report.title, "Road trip (sorted by duration desc)");
    assert_eq!(report.video_count, 4);

    let created = &requests_to(&server, http::Method::POST, "/playlists").await[0];
    let body: Value = created.body_json().unwrap();
    assert_eq!(body["snippet"]["title"], "Road trip (sorted by duration desc)");
    assert_eq!(body["status"]["privacyStatus"], "unlisted");

    // descending, with the video of unknown length first
    let inserted: Vec<(String, u64)> = requests_to(&server, http::Method::POST, "/playlistItems")
        .await
        .iter()
        .map(|request| {
            let body: Value = request.body_json().unwrap();
            (
                body["snippet"]["resourceId"]["videoId"]
                    .as_str()
                    .unwrap()
                    .to_string(),
                body["snippet"]["position"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        inserted,
        [
            ("gone".to_string(), 0),
            ("long".to_string(), 1),
            ("medium".to_string(), 2),
            ("short".to_string(), 3),
        ]
    );
}

#[tokio::test]
async fn failed_insert_stops_the_copy_and_reports_progress() {
    let server = MockServer::start().await;
    mount_source_playlist(&server).await;
    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(item_json("PLsorted", "whatever", 0)),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(error_json(403, "quotaExceeded")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = playlist::create_sorted_copy(
        &client(&server),
        "PLsrc",
        SortOptions {
            key: SortKey::Title,
            ..SortOptions::default()
        },
        &Progress::hidden(),
    )
    .await
    .unwrap_err();

    let message = format!("{report:#}");
    assert!(message.contains("PLsorted"), "{message}");
    assert!(message.contains("1 of 4 videos were added"), "{message}");
    assert!(matches!(
        Error::find_in(&report),
        Some(Error::RemoteApi { message, .. }) if message == "quotaExceeded"
    ));
}

#[tokio::test]
async fn empty_playlists_are_not_copied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("id", "PLempty"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [playlist_json("PLempty", "Nothing")] })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let result = playlist::create_sorted_copy(
        &client(&server),
        "PLempty",
        SortOptions::default(),
        &Progress::hidden(),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn videos_with_durations() {
    let server = MockServer::start().await;
    mount_source_playlist(&server).await;

    let videos = playlist::collect_videos(&client(&server), "PLsrc", true, &Progress::hidden())
        .await
        .unwrap();

    let durations: Vec<_> = videos
        .iter()
        .map(|video| (video.video_id.as_str(), video.duration_seconds))
        .collect();
    assert_eq!(
        durations,
        [
            ("medium", Some(300)),
            ("short", Some(30)),
            ("gone", None),
            ("long", Some(3600)),
        ]
    );
    assert_eq!(videos[0].channel.as_deref(), Some("Some channel"));
    assert_eq!(videos[0].published_at, Some("2023-01-01T00:00:00Z".parse().unwrap()));
}

#[tokio::test]
async fn status_reports_valid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("maxResults", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::in_dir(dir.path());
    write_client_secrets(&paths, &server);
    TokenStore::new(&paths.token)
        .save(&token("ya29.valid"))
        .await
        .unwrap();

    let state = credentials::status(&paths, Some(&server.uri()))
        .await
        .unwrap();
    assert_eq!(state, CredentialState::Valid);
}

#[tokio::test]
async fn status_discards_credentials_that_cannot_be_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::in_dir(dir.path());
    write_client_secrets(&paths, &server);
    let expired = TimeBoundAccessToken::expired(token("ya29.old").raw_token().clone());
    TokenStore::new(&paths.token).save(&expired).await.unwrap();

    let state = credentials::status(&paths, Some(&server.uri()))
        .await
        .unwrap();
    assert_eq!(state, CredentialState::Rejected);
    assert!(!paths.token.exists());
}

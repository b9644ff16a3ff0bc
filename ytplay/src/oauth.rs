//! OAuth 2.0 management for YouTube API authentication.
//!
//! This module encapsulates the OAuth operations `ytplay` needs: the initial user authorization
//! (an installed-application flow with PKCE and a loopback redirect) and token refresh.

use crate::Error;
use crate::config::ClientSecrets;
use bytes::Bytes;
use eyre::Context;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RequestTokenError, Scope, TokenResponse, TokenUrl, reqwest,
};
use std::future::Future;

/// Grants read and write access to the user's playlists.
const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube";

const OAUTH_DONE: &str = include_str!("../oauth_success.html");

/// Manages OAuth 2.0 authentication flows for YouTube API access.
///
/// Holds the client credentials from the user's client secret file and uses them for both the
/// consent flow and refreshes.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    secrets: ClientSecrets,
}

impl OAuthManager {
    pub fn new(secrets: ClientSecrets) -> Self {
        Self { secrets }
    }

    fn http_client() -> eyre::Result<reqwest::Client> {
        reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")
    }

    fn token_url(&self) -> Result<TokenUrl, Error> {
        TokenUrl::new(self.secrets.token_uri.clone()).map_err(|e| {
            Error::Config(format!(
                "invalid token_uri {:?} in client secret file: {e}",
                self.secrets.token_uri
            ))
        })
    }

    /// Performs a complete OAuth 2.0 authorization flow to obtain a new access token.
    ///
    /// This:
    /// 1. starts a one-shot HTTP server on a random loopback port to receive the redirect,
    /// 2. opens the user's browser at the consent screen (and prints the URL in case that fails),
    /// 3. exchanges the returned authorization code, with the PKCE verifier, for a token.
    pub async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let auth_url = AuthUrl::new(self.secrets.auth_uri.clone()).map_err(|e| {
            Error::Config(format!(
                "invalid auth_uri {:?} in client secret file: {e}",
                self.secrets.auth_uri
            ))
        })?;
        let token_url = self.token_url()?;

        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf.clone())
            .add_scope(Scope::new(YOUTUBE_SCOPE.to_string()))
            // without offline access Google doesn't hand out a refresh token
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        eprintln!(
            "Opening your browser to sign in to YouTube. If it doesn't open, visit:\n\n  {auth_url}\n"
        );
        if let Err(e) = webbrowser::open(auth_url.as_ref()) {
            tracing::warn!("could not open browser: {e}");
        }
        let authorization_code = eventually_authorization_code
            .await
            .context("await user authorization code")?;

        let http_client = Self::http_client()?;
        let token_result = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .map_err(auth_error)
            .context("exchange authorization code with access token")?;

        if token_result.refresh_token().is_none() {
            tracing::warn!("authorization server did not issue a refresh token");
        }

        Ok(token_result)
    }

    /// Attempts to refresh an existing OAuth token using its refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - Refresh succeeded, new token is available
    /// * `Ok(None)` - There is no refresh token, or the server no longer accepts it
    /// * `Err(_)` - Network or other error occurred during refresh attempt
    ///
    /// When this returns `Ok(None)` the token should be considered invalid and the user has to go
    /// through [`Self::authenticate`] again.
    pub async fn refresh_token(
        &self,
        token: &BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

        // no redirect URL needed for refresh
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_token_uri(self.token_url()?);

        let http_client = Self::http_client()?;

        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&http_client)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(auth_error(e)).context("exchange refresh token"),
        }
    }

    /// Sets up a local HTTP server to receive the OAuth authorization callback.
    ///
    /// The server accepts exactly one connection, validates the CSRF token, and extracts the
    /// authorization code from the callback.
    ///
    /// Returns the redirect URL to use in the OAuth flow and a future that resolves to the
    /// authorization code once the callback is received.
    async fn setup_redirect(
        &self,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>>,
    )> {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    async move {
                        let code = parse_callback(req.uri().query().unwrap_or(""), &csrf)?;
                        // the receiver only goes away once the server has shut down
                        let _ = got.send(code).await;
                        Ok::<_, String>(Response::new(Full::<Bytes>::from(OAUTH_DONE)))
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = &mut serve => {
                        if let Err(e) = exit {
                            Err(e).context("redirect server got bad request")
                        } else {
                            eyre::bail!("redirect server exit prematurely");
                        }
                    }
                    code = gotten.recv() => {
                        serve.as_mut().graceful_shutdown();
                        // let the success page make it to the browser
                        let _ = serve.await;
                        code.ok_or_else(|| eyre::eyre!("redirect handler exited without a code"))
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            let code = rx.await.context("redirect future dropped prematurely")?;
            code.map_err(|e| eyre::Report::new(Error::Auth(format!("{e:#}"))))
        }))
    }
}

/// Extracts the authorization code from the query string of the OAuth redirect.
fn parse_callback(query: &str, csrf: &CsrfToken) -> Result<AuthorizationCode, String> {
    let mut state = None;
    let mut code = None;
    let mut error = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match &*key {
            "state" => state = Some(value),
            "code" => code = Some(value),
            "error" => error = Some(value),
            _ => {}
        }
    }
    if state.as_deref() != Some(csrf.secret().as_str()) {
        return Err("invalid csrf token".to_string());
    }
    if let Some(error) = error {
        // e.g. access_denied when the user declines
        return Err(format!("authorization was not granted: {error}"));
    }
    code.map(|code| AuthorizationCode::new(code.into_owned()))
        .ok_or_else(|| "no authorization code found".to_string())
}

/// Turns a failed token exchange into an [`Error::Auth`] that carries the server's explanation.
fn auth_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> Error
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => Error::Auth(response.to_string()),
        RequestTokenError::Request(e) => Error::Auth(format!("token request failed: {e}")),
        RequestTokenError::Parse(e, _) => {
            Error::Auth(format!("token endpoint sent an unparseable response: {e}"))
        }
        RequestTokenError::Other(e) => Error::Auth(e),
    }
}

//! OAuth 2.0 management for caption access.
//!
//! Downloading captions needs an authorized session with the
//! `youtube.force-ssl` scope. This module runs the installed-application
//! authorization-code flow, refreshes tokens, and keeps the resulting token in
//! a cache file so later exports don't need the browser again.
//!
//! The export pipeline only sees the [`SessionProvider`] capability; nothing
//! outside this module touches the token cache path.

#![allow(async_fn_in_trait)]

use crate::youtube_api::{TimeBoundAccessToken, YouTubeClient};
use eyre::{Context, OptionExt};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, Scope, TokenUrl,
};
use oauth2::{TokenResponse, reqwest};
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Scope needed to list and download caption tracks.
pub const YOUTUBE_CAPTIONS_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const OAUTH_DONE_HTML: &str = "<!DOCTYPE html>\
<html><head><title>YouTube exporter</title></head>\
<body><p>Authorization complete. You can close this tab and return to the exporter.</p></body>\
</html>";

/// The OAuth client configuration downloaded from the Google Cloud console.
///
/// Desktop clients put their settings under `installed`, web clients under
/// `web`; either is accepted.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

impl ClientSecrets {
    /// Parses a Google client secrets JSON document.
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).context("parse OAuth client secrets")?;
        file.installed
            .or(file.web)
            .ok_or_eyre("OAuth client secrets have neither an `installed` nor a `web` section")
    }

    pub async fn from_path(path: &Path) -> eyre::Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read OAuth client secrets from {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// Manages OAuth 2.0 authentication flows for YouTube API access.
///
/// The OAuthManager encapsulates all OAuth operations, providing a consistent interface
/// for both initial user authentication and token refresh operations.
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

    fn token_url(&self) -> eyre::Result<TokenUrl> {
        TokenUrl::new(self.secrets.token_uri.clone()).context("parse token endpoint URL")
    }

    /// Performs a complete OAuth 2.0 authorization flow to obtain a new access token.
    ///
    /// This method initiates the full OAuth flow, including:
    /// 1. Opening the user's browser for authorization
    /// 2. Setting up a local HTTP server to receive the authorization callback
    /// 3. Exchanging the authorization code for an access token
    pub async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let auth_url =
            AuthUrl::new(self.secrets.auth_uri.clone()).context("parse authorization URL")?;
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(self.token_url()?)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf.clone())
            .add_scope(Scope::new(YOUTUBE_CAPTIONS_SCOPE.to_string()))
            // Ask for a refresh token so the cached session outlives the access token.
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        if let Err(e) = webbrowser::open(auth_url.as_ref()) {
            tracing::warn!(error = %e, "could not open browser, open the URL above manually");
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
            .context("exchange authorization code with access token")?;

        Ok(token_result)
    }

    /// Attempts to refresh an existing OAuth token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - Refresh succeeded, new token is available
    /// * `Ok(None)` - Refresh failed or no refresh token available
    /// * `Err(_)` - Network or other error occurred during refresh attempt
    ///
    /// When refresh fails, the token should be considered invalid and the user
    /// should be sent through [`Self::authenticate`] again.
    pub async fn refresh_token(
        &self,
        token: BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

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
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }

    /// Sets up a local HTTP server to receive the OAuth authorization callback.
    ///
    /// Creates a temporary HTTP server on a random local port to handle the OAuth
    /// redirect after user authorization. The server validates the CSRF token and
    /// extracts the authorization code from the callback.
    ///
    /// # Returns
    ///
    /// A tuple containing:
    /// - The redirect URL to use in the OAuth flow
    /// - A future that resolves to the authorization code when the callback is received
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
                        let mut presented_state = None;
                        let mut presented_code = None;
                        for (k, v) in
                            form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes())
                        {
                            match &*k {
                                "state" => presented_state = Some(v),
                                "code" => presented_code = Some(v),
                                _ => {}
                            }
                        }
                        if presented_state.as_deref() != Some(csrf.secret().as_str()) {
                            return Err("invalid csrf token");
                        }
                        let Some(code) = presented_code else {
                            return Err("no authorization code found");
                        };
                        let code = AuthorizationCode::new(code.into_owned());
                        if got.send(code).await.is_err() {
                            return Err("authorization code receiver went away");
                        }
                        Ok(Response::new(Full::<Bytes>::from(OAUTH_DONE_HTML)))
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
                        code.ok_or_eyre("redirect server stopped before receiving a code")
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

/// Something that can hand out an authorized session for caption access.
pub trait SessionProvider {
    async fn obtain_session(&self) -> eyre::Result<YouTubeClient>;
}

/// Session provider backed by a client secrets file and a token cache file.
///
/// A cached token is always refreshed before use. When there is no cache, or
/// the refresh grant has been revoked, the browser flow runs again. Whatever
/// token ends up in use is written back to the cache.
#[derive(Debug, Clone)]
pub struct OAuthSessionProvider {
    client_secrets: PathBuf,
    token_cache: PathBuf,
    http: ::reqwest::Client,
}

impl OAuthSessionProvider {
    pub fn new(
        client_secrets: impl Into<PathBuf>,
        token_cache: impl Into<PathBuf>,
        http: ::reqwest::Client,
    ) -> Self {
        Self {
            client_secrets: client_secrets.into(),
            token_cache: token_cache.into(),
            http,
        }
    }

    async fn load_cached_token(&self) -> Option<BasicTokenResponse> {
        let json = tokio::fs::read_to_string(&self.token_cache).await.ok()?;
        match serde_json::from_str(&json) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(
                    path = %self.token_cache.display(),
                    error = %e,
                    "ignoring unreadable token cache"
                );
                None
            }
        }
    }

    async fn store_token(&self, token: &BasicTokenResponse) -> eyre::Result<()> {
        let json = serde_json::to_string(token).context("serialize OAuth token")?;
        tokio::fs::write(&self.token_cache, json)
            .await
            .with_context(|| format!("write token cache {}", self.token_cache.display()))
    }
}

impl SessionProvider for OAuthSessionProvider {
    #[tracing::instrument(skip(self), fields(token_cache = %self.token_cache.display()))]
    async fn obtain_session(&self) -> eyre::Result<YouTubeClient> {
        let secrets = ClientSecrets::from_path(&self.client_secrets).await?;
        let oauth_manager = Arc::new(OAuthManager::new(secrets));

        let cached = match self.load_cached_token().await {
            Some(token) => {
                let mut token = TimeBoundAccessToken::expired(token);
                if token
                    .refresh(&oauth_manager)
                    .await
                    .context("refresh cached token")?
                {
                    tracing::debug!("reusing cached OAuth session");
                    Some(token)
                } else {
                    tracing::warn!("cached token could not be refreshed, re-authenticating");
                    None
                }
            }
            None => None,
        };

        let token = match cached {
            Some(token) => token,
            None => {
                let raw = oauth_manager
                    .authenticate()
                    .await
                    .context("authorize user to YouTube")?;
                TimeBoundAccessToken::new(raw)
            }
        };

        self.store_token(token.raw_token()).await?;

        Ok(YouTubeClient::with_session(
            token,
            oauth_manager,
            self.http.clone(),
        ))
    }
}

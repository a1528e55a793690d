//! Core YouTube API client functionality and authentication management.

use crate::error::HttpFailure;
use crate::oauth::OAuthManager;
use crate::youtube_api::{
    CaptionApi, CaptionListResponse, ChannelListResponse, PlaylistItemListResponse,
    SearchListResponse, VideoListResponse, YouTubeApi,
};
use eyre::Context;
use http::Method;
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::instrument;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    /// The current OAuth2 token
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: SystemTime,
}

impl TimeBoundAccessToken {
    /// Creates a new YouTube token that is already expired, forcing immediate refresh.
    ///
    /// This is useful when loading tokens from storage where you want to ensure
    /// they are validated before use.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: SystemTime::UNIX_EPOCH,
            token,
        }
    }

    /// Creates a new YouTube token with calculated expiry time.
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
            .refresh_token(self.token.clone())
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually omits the refresh token from refresh responses.
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Uses the current time + expires_in duration - 5 minute safety buffer.
    /// If no expires_in is provided, assumes a conservative 55-minute lifetime.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        if let Some(expires_in) = token.expires_in() {
            (now + expires_in)
                .checked_sub(Duration::from_secs(300))
                .unwrap_or(now)
        } else {
            now + Duration::from_secs(3300)
        }
    }
}

/// How requests made by a [`YouTubeClient`] are authorized.
#[derive(Debug, Clone)]
enum Credentials {
    /// A developer API key, sent as the `key` query parameter.
    ///
    /// Enough for public reads; cannot touch captions.
    ApiKey(String),
    /// An OAuth2 session, sent as a bearer token and refreshed on expiry.
    Session {
        token: Arc<Mutex<TimeBoundAccessToken>>,
        oauth_manager: Arc<OAuthManager>,
    },
}

/// Client for interacting with the YouTube Data API v3.
///
/// Created either with an API key ([`YouTubeClient::with_api_key`]) for the
/// public read endpoints, or with an OAuth session ([`YouTubeClient::with_session`])
/// for caption access. A session client refreshes its access token before any
/// request made after the token's (buffered) expiry.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    credentials: Credentials,
    /// HTTP client for API requests
    client: reqwest::Client,
}

impl YouTubeClient {
    pub fn with_api_key(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            credentials: Credentials::ApiKey(api_key.into()),
            client,
        }
    }

    pub fn with_session(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            credentials: Credentials::Session {
                token: Arc::new(Mutex::new(token)),
                oauth_manager,
            },
            client,
        }
    }

    /// Returns a clone of the underlying OAuth2 token, if this is a session client.
    pub async fn token(&self) -> Option<BasicTokenResponse> {
        match &self.credentials {
            Credentials::ApiKey(_) => None,
            Credentials::Session { token, .. } => Some(token.lock().await.token.clone()),
        }
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip_all)]
    async fn fresh_access_token(
        token: &Mutex<TimeBoundAccessToken>,
        oauth_manager: &OAuthManager,
    ) -> eyre::Result<String> {
        let mut token = token.lock().await;

        if SystemTime::now() >= token.expires_at {
            tracing::debug!("access token expired, attempting refresh");

            if token.refresh(oauth_manager).await? {
                tracing::debug!("access token successfully refreshed");
            } else {
                tracing::error!("access token refresh failed, client is unusable");
                return Err(eyre::eyre!("Unable to refresh expired access token"));
            }
        }

        Ok(token.token.access_token().secret().to_string())
    }

    /// Makes an authorized HTTP request to the YouTube API with common error handling.
    ///
    /// This method consolidates the shared logic across all YouTube API requests:
    /// - API key or bearer token, depending on how the client was built
    /// - Query parameters
    /// - Status code validation; the body of a failed response is kept so the
    ///   caller can extract Google's error reason from it
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn make_request(
        &self,
        method: Method,
        url: &str,
        query_params: &[(&str, &str)],
    ) -> Result<reqwest::Response, HttpFailure> {
        let mut request = self.client.request(method.clone(), url).query(query_params);

        request = match &self.credentials {
            Credentials::ApiKey(key) => request.query(&[("key", key.as_str())]),
            Credentials::Session {
                token,
                oauth_manager,
            } => {
                let access_token = Self::fresh_access_token(token, oauth_manager)
                    .await
                    .map_err(|e| HttpFailure::transport(format!("{e:#}")))?;
                request.bearer_auth(access_token)
            }
        };

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, url, error = %e, "request to YouTube API failed");
            HttpFailure::from(e)
        })?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            tracing::debug!(
                %method,
                url,
                status = status_code.as_u16(),
                "YouTube API request failed"
            );
            return Err(HttpFailure::new(status_code.as_u16(), error_text));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, HttpFailure> {
        let response = self.make_request(Method::GET, url, query_params).await?;
        let status = response.status().as_u16();
        response.json().await.map_err(|e| HttpFailure {
            status: Some(status),
            body: format!("parse YouTube API response as JSON: {e}"),
        })
    }

    async fn list_channels(
        &self,
        part: &str,
        filter: (&str, &str),
    ) -> Result<ChannelListResponse, HttpFailure> {
        let url = format!("{API_BASE}/channels");
        let query_params = [("part", part), filter];

        let channels: ChannelListResponse = self.get_json(&url, &query_params).await?;

        tracing::debug!(
            filter = filter.0,
            value = filter.1,
            returned_items = channels.items.len(),
            "fetched channels"
        );

        Ok(channels)
    }
}

impl YouTubeApi for YouTubeClient {
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    async fn channels_by_handle(&self, handle: &str) -> Result<ChannelListResponse, HttpFailure> {
        self.list_channels("id", ("forHandle", handle)).await
    }

    async fn channels_by_username(
        &self,
        username: &str,
    ) -> Result<ChannelListResponse, HttpFailure> {
        self.list_channels("id", ("forUsername", username)).await
    }

    async fn channel_content_details(
        &self,
        channel_id: &str,
    ) -> Result<ChannelListResponse, HttpFailure> {
        self.list_channels("contentDetails", ("id", channel_id))
            .await
    }

    /// Searches for channels matching `query`.
    ///
    /// # API Cost
    ///
    /// A search costs 100 quota units, against 1 for every other call here.
    ///
    /// See: <https://developers.google.com/youtube/v3/docs/search/list>
    #[instrument(skip(self))]
    async fn search_channels(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<SearchListResponse, HttpFailure> {
        let url = format!("{API_BASE}/search");
        let max_results_string = max_results.to_string();
        let query_params = [
            ("part", "snippet"),
            ("q", query),
            ("type", "channel"),
            ("maxResults", max_results_string.as_str()),
        ];

        let results: SearchListResponse = self.get_json(&url, &query_params).await?;

        tracing::debug!(
            total_results = results.page_info.total_results,
            returned_items = results.items.len(),
            "searched channels"
        );

        Ok(results)
    }

    /// See: <https://developers.google.com/youtube/v3/docs/playlistItems/list>
    #[instrument(skip(self))]
    async fn playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse, HttpFailure> {
        let url = format!("{API_BASE}/playlistItems");
        let max_results_string = max_results.to_string();
        let mut query_params = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results_string.as_str()),
        ];

        if let Some(token) = page_token {
            query_params.push(("pageToken", token));
        }

        let page: PlaylistItemListResponse = self.get_json(&url, &query_params).await?;

        tracing::debug!(
            total_results = page.page_info.total_results,
            returned_items = page.items.len(),
            has_next_page = page.next_page_token.is_some(),
            "fetched playlist items"
        );

        Ok(page)
    }

    /// See: <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip_all, fields(count = video_ids.len()))]
    async fn videos(&self, video_ids: &[String]) -> Result<VideoListResponse, HttpFailure> {
        let url = format!("{API_BASE}/videos");
        let ids = video_ids.join(",");
        let query_params = [("part", "snippet,statistics"), ("id", ids.as_str())];

        let videos: VideoListResponse = self.get_json(&url, &query_params).await?;

        tracing::debug!(
            requested = video_ids.len(),
            returned_items = videos.items.len(),
            "fetched video details"
        );

        Ok(videos)
    }
}

impl CaptionApi for YouTubeClient {
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.force-ssl`
    ///
    /// See: <https://developers.google.com/youtube/v3/docs/captions/list>
    #[instrument(skip(self))]
    async fn list_captions(&self, video_id: &str) -> Result<CaptionListResponse, HttpFailure> {
        let url = format!("{API_BASE}/captions");
        let query_params = [("part", "snippet"), ("videoId", video_id)];

        let captions: CaptionListResponse = self.get_json(&url, &query_params).await?;

        tracing::debug!(
            video_id,
            returned_items = captions.items.len(),
            "fetched caption tracks"
        );

        Ok(captions)
    }

    /// Only works for videos owned by the authorized account, or whose owner
    /// allows third-party contributions.
    ///
    /// See: <https://developers.google.com/youtube/v3/docs/captions/download>
    #[instrument(skip(self))]
    async fn download_caption(
        &self,
        caption_id: &str,
        format: &str,
    ) -> Result<String, HttpFailure> {
        let url = format!("{API_BASE}/captions/{caption_id}");
        let query_params = [("tfmt", format)];

        let response = self.make_request(Method::GET, &url, &query_params).await?;
        let bytes = response.bytes().await.map_err(HttpFailure::from)?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

//! YouTube Data API v3 boundary.
//!
//! This module holds the strongly-typed response layer for the handful of
//! endpoints the exporter uses, and the two capability traits the pipeline is
//! written against:
//!
//! - [`YouTubeApi`]: key-authenticated reads (channel lookups, channel search,
//!   playlist pagination, batched video details).
//! - [`CaptionApi`]: session-authenticated caption listing and download, which
//!   needs the `youtube.force-ssl` scope.
//!
//! [`YouTubeClient`] implements both over `reqwest`. Tests implement them with
//! in-memory fakes.
//!
//! Every method returns the raw [`HttpFailure`] on error; classification into
//! user-facing errors is the pipeline's job (see [`crate::error::classify`]).
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_exporter::youtube_api::{YouTubeApi, YouTubeClient};
//!
//! # async fn example() -> Result<(), youtube_exporter::error::HttpFailure> {
//! let client = YouTubeClient::with_api_key("AIza...", reqwest::Client::new());
//! let channels = client.channels_by_handle("@example").await?;
//! for channel in channels.items {
//!     println!("{}", channel.id);
//! }
//! # Ok(())
//! # }
//! ```

#![allow(async_fn_in_trait)]

pub mod captions;
pub mod channels;
pub mod client;
pub mod playlist_items;
pub mod search;
pub mod types;
pub mod videos;

pub use client::{TimeBoundAccessToken, YouTubeClient};
pub use types::PageInfo;

pub use captions::{Caption, CaptionListResponse, CaptionSnippet};
pub use channels::{Channel, ChannelListResponse};
pub use playlist_items::{PlaylistItem, PlaylistItemListResponse};
pub use search::{SearchListResponse, SearchResult};
pub use videos::{Thumbnail, Thumbnails, Video, VideoListResponse, VideoSnippet, VideoStatistics};

use crate::error::HttpFailure;

/// Largest page size any of the list endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Read-only YouTube endpoints used to resolve a channel and collect its uploads.
pub trait YouTubeApi {
    /// `channels.list?part=id&forHandle=<handle>`
    async fn channels_by_handle(&self, handle: &str) -> Result<ChannelListResponse, HttpFailure>;

    /// `channels.list?part=id&forUsername=<username>`
    async fn channels_by_username(
        &self,
        username: &str,
    ) -> Result<ChannelListResponse, HttpFailure>;

    /// `channels.list?part=contentDetails&id=<channel_id>`
    async fn channel_content_details(
        &self,
        channel_id: &str,
    ) -> Result<ChannelListResponse, HttpFailure>;

    /// `search.list?part=snippet&type=channel&q=<query>&maxResults=<max_results>`
    async fn search_channels(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<SearchListResponse, HttpFailure>;

    /// One page of `playlistItems.list?part=contentDetails`.
    async fn playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse, HttpFailure>;

    /// `videos.list?part=snippet,statistics&id=<ids joined by ','>`, at most 50 IDs.
    async fn videos(&self, video_ids: &[String]) -> Result<VideoListResponse, HttpFailure>;
}

/// Caption endpoints, which require an authorized session.
pub trait CaptionApi {
    /// `captions.list?part=snippet&videoId=<video_id>`
    async fn list_captions(&self, video_id: &str) -> Result<CaptionListResponse, HttpFailure>;

    /// `captions.download` of one track, converted to `format` (e.g. `srt`).
    async fn download_caption(&self, caption_id: &str, format: &str)
    -> Result<String, HttpFailure>;
}

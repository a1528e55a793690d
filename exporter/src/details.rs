//! Per-video metadata and the exported record type.

use crate::error::{ExportError, classify};
use crate::youtube_api::{MAX_PAGE_SIZE, Thumbnails, Video, YouTubeApi};
use jiff::fmt::temporal::Pieces;
use serde::{Deserialize, Serialize};

/// One exported video, in the column order of the CSV output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Always `https://www.youtube.com/watch?v=<video_id>`.
    pub video_url: String,
    pub title: String,
    pub thumbnail_url: String,
    /// As reported by the API: a decimal string, or empty when hidden.
    pub view_count: String,
    /// `YYYY-MM-DD`, or the raw publish timestamp if it couldn't be parsed.
    pub posted_date: String,
    /// Empty unless a caption track was fetched.
    pub transcript: String,
    #[serde(skip)]
    pub(crate) video_id: String,
}

impl VideoRecord {
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    fn from_video(video: Video) -> Self {
        let snippet = video.snippet.unwrap_or_default();
        let statistics = video.statistics.unwrap_or_default();
        Self {
            video_url: watch_url(&video.id),
            title: snippet.title.unwrap_or_default(),
            thumbnail_url: pick_thumbnail(&snippet.thumbnails).to_string(),
            view_count: statistics.view_count.unwrap_or_default(),
            posted_date: posted_date(snippet.published_at.as_deref().unwrap_or_default()),
            transcript: String::new(),
            video_id: video.id,
        }
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Picks the largest available thumbnail: `maxres`, `standard`, `high`,
/// `medium`, then `default`. Returns `""` when there is none.
pub fn pick_thumbnail(thumbnails: &Thumbnails) -> &str {
    [
        &thumbnails.maxres,
        &thumbnails.standard,
        &thumbnails.high,
        &thumbnails.medium,
        &thumbnails.default,
    ]
    .into_iter()
    .flatten()
    .find_map(|thumbnail| thumbnail.url.as_deref())
    .unwrap_or_default()
}

/// Calendar date of an ISO 8601 timestamp, in the offset it was written in.
///
/// Anything that doesn't parse is passed through unchanged.
pub fn posted_date(published_at: &str) -> String {
    Pieces::parse(published_at)
        .map(|pieces| pieces.date().to_string())
        .unwrap_or_else(|_| published_at.to_string())
}

/// Fetches snippet and statistics for `video_ids`, 50 per request.
///
/// Records come back batch by batch; within a batch they follow the API's
/// response order, which need not match the order of the IDs. IDs the API
/// doesn't return (deleted or private videos) are left out.
pub async fn video_details(
    api: &impl YouTubeApi,
    video_ids: &[String],
) -> Result<Vec<VideoRecord>, ExportError> {
    let mut records = Vec::with_capacity(video_ids.len());

    for batch in video_ids.chunks(MAX_PAGE_SIZE as usize) {
        let response = api
            .videos(batch)
            .await
            .map_err(|e| classify(&e, "fetching video details"))?;
        records.extend(response.items.into_iter().map(VideoRecord::from_video));
    }

    Ok(records)
}

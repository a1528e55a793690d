//! Enumerating a channel's uploads.

use crate::error::{ExportError, classify};
use crate::youtube_api::{MAX_PAGE_SIZE, YouTubeApi};
use std::collections::HashSet;

/// Looks up the ID of the playlist that holds every upload of `channel_id`.
pub async fn uploads_playlist_id(
    api: &impl YouTubeApi,
    channel_id: &str,
) -> Result<String, ExportError> {
    let response = api
        .channel_content_details(channel_id)
        .await
        .map_err(|e| classify(&e, "fetching uploads playlist id"))?;

    response
        .items
        .first()
        .and_then(|channel| channel.uploads_playlist_id())
        .map(str::to_string)
        .ok_or_else(|| ExportError::generic("Channel contentDetails not found"))
}

/// Collects up to `max_videos` video IDs from the uploads playlist, newest first.
///
/// Pages are requested no larger than what is still missing, and collection
/// stops the moment the limit is hit rather than after one more page. IDs seen
/// on an earlier page are skipped.
pub async fn list_upload_video_ids(
    api: &impl YouTubeApi,
    uploads_playlist_id: &str,
    max_videos: u32,
) -> Result<Vec<String>, ExportError> {
    let limit = max_videos as usize;
    let mut video_ids = Vec::with_capacity(limit.min(MAX_PAGE_SIZE as usize));
    let mut seen = HashSet::new();
    let mut page_token: Option<String> = None;

    loop {
        let remaining = limit.saturating_sub(video_ids.len());
        if remaining == 0 {
            break;
        }
        let page_size = (remaining as u32).min(MAX_PAGE_SIZE);

        let page = api
            .playlist_items(uploads_playlist_id, page_size, page_token.as_deref())
            .await
            .map_err(|e| classify(&e, "listing channel uploads"))?;

        for video_id in page.items.iter().filter_map(|item| item.video_id()) {
            if !seen.insert(video_id.to_string()) {
                continue;
            }
            video_ids.push(video_id.to_string());
            if video_ids.len() >= limit {
                return Ok(video_ids);
            }
        }

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(video_ids)
}

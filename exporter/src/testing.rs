//! In-memory stand-ins for the YouTube and Sheets APIs.

use crate::error::HttpFailure;
use crate::sheets::SheetsApi;
use crate::youtube_api::{
    CaptionApi, CaptionListResponse, ChannelListResponse, PlaylistItemListResponse,
    SearchListResponse, Video, VideoListResponse, YouTubeApi,
};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;

/// A `videos.list` item.
pub(crate) fn video_json(id: &str, title: &str, published_at: &str, views: &str) -> serde_json::Value {
    json!({
        "kind": "youtube#video",
        "id": id,
        "snippet": {
            "title": title,
            "publishedAt": published_at,
            "thumbnails": {
                "default": { "url": format!("https://i.ytimg.com/vi/{id}/default.jpg"), "width": 120, "height": 90 },
                "high": { "url": format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"), "width": 480, "height": 360 }
            }
        },
        "statistics": { "viewCount": views, "likeCount": "1", "commentCount": "0" }
    })
}

fn google_error(status: u16, reason: &str) -> HttpFailure {
    let body = json!({
        "error": {
            "code": status,
            "message": "fake failure",
            "errors": [{ "domain": "youtube", "reason": reason, "message": "fake failure" }]
        }
    });
    HttpFailure::new(status, body.to_string())
}

fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).expect("fake response matches the response types")
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Calls {
    pub handle: usize,
    pub username: usize,
    pub content_details: usize,
    pub search: usize,
    pub playlist_items: usize,
    pub videos: usize,
}

/// A channel catalogue that answers like the YouTube Data API.
///
/// Playlist pages are cut from the stored uploads list using the requested
/// page size; the page token is the offset of the next page.
#[derive(Debug, Default)]
pub(crate) struct FakeYouTube {
    handles: HashMap<String, String>,
    usernames: HashMap<String, String>,
    searches: HashMap<String, String>,
    uploads_playlists: HashMap<String, String>,
    uploads: HashMap<String, Vec<String>>,
    videos: HashMap<String, serde_json::Value>,
    failure: Option<HttpFailure>,
    pub calls: RefCell<Calls>,
    pub page_sizes: RefCell<Vec<u32>>,
    pub video_batches: RefCell<Vec<usize>>,
}

impl FakeYouTube {
    pub fn with_handle(mut self, handle: &str, channel_id: &str) -> Self {
        self.handles.insert(handle.into(), channel_id.into());
        self
    }

    pub fn with_username(mut self, username: &str, channel_id: &str) -> Self {
        self.usernames.insert(username.into(), channel_id.into());
        self
    }

    pub fn with_search(mut self, query: &str, channel_id: &str) -> Self {
        self.searches.insert(query.into(), channel_id.into());
        self
    }

    pub fn with_uploads(mut self, channel_id: &str, playlist_id: &str, video_ids: Vec<String>) -> Self {
        self.uploads_playlists.insert(channel_id.into(), playlist_id.into());
        self.uploads.insert(playlist_id.into(), video_ids);
        self
    }

    pub fn with_video(mut self, video: serde_json::Value) -> Self {
        let id = video["id"].as_str().expect("video has an id").to_string();
        self.videos.insert(id, video);
        self
    }

    /// Every call fails with this Google error reason.
    pub fn failing_with(mut self, status: u16, reason: &str) -> Self {
        self.failure = Some(google_error(status, reason));
        self
    }

    pub fn total_calls(&self) -> usize {
        let c = self.calls.borrow();
        c.handle + c.username + c.content_details + c.search + c.playlist_items + c.videos
    }

    fn check(&self) -> Result<(), HttpFailure> {
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn channel_list(found: Option<&String>) -> ChannelListResponse {
        let items: Vec<_> = found.into_iter().map(|id| json!({ "id": id })).collect();
        parse(json!({
            "kind": "youtube#channelListResponse",
            "pageInfo": { "totalResults": items.len(), "resultsPerPage": 5 },
            "items": items
        }))
    }
}

impl YouTubeApi for FakeYouTube {
    async fn channels_by_handle(&self, handle: &str) -> Result<ChannelListResponse, HttpFailure> {
        self.calls.borrow_mut().handle += 1;
        self.check()?;
        Ok(Self::channel_list(self.handles.get(handle)))
    }

    async fn channels_by_username(&self, username: &str) -> Result<ChannelListResponse, HttpFailure> {
        self.calls.borrow_mut().username += 1;
        self.check()?;
        Ok(Self::channel_list(self.usernames.get(username)))
    }

    async fn channel_content_details(&self, channel_id: &str) -> Result<ChannelListResponse, HttpFailure> {
        self.calls.borrow_mut().content_details += 1;
        self.check()?;
        // misses come back without an `items` key at all
        let Some(playlist) = self.uploads_playlists.get(channel_id) else {
            return Ok(parse(json!({ "kind": "youtube#channelListResponse", "pageInfo": {} })));
        };
        Ok(parse(json!({
            "items": [{
                "id": channel_id,
                "contentDetails": { "relatedPlaylists": { "likes": "", "uploads": playlist } }
            }]
        })))
    }

    async fn search_channels(&self, query: &str, max_results: u32) -> Result<SearchListResponse, HttpFailure> {
        self.calls.borrow_mut().search += 1;
        self.check()?;
        assert_eq!(max_results, 1);
        let items: Vec<_> = self
            .searches
            .get(query)
            .into_iter()
            .map(|id| {
                json!({
                    "id": { "kind": "youtube#channel", "channelId": id },
                    "snippet": { "channelId": id, "title": query }
                })
            })
            .collect();
        Ok(parse(json!({ "items": items })))
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse, HttpFailure> {
        self.calls.borrow_mut().playlist_items += 1;
        self.page_sizes.borrow_mut().push(max_results);
        self.check()?;

        let all = self.uploads.get(playlist_id).cloned().unwrap_or_default();
        let start: usize = page_token.map_or(0, |t| t.parse().expect("numeric page token"));
        let end = (start + max_results as usize).min(all.len());
        let items: Vec<_> = all[start.min(end)..end]
            .iter()
            .map(|id| json!({ "contentDetails": { "videoId": id } }))
            .collect();

        let mut page = json!({
            "pageInfo": { "totalResults": all.len(), "resultsPerPage": max_results },
            "items": items
        });
        if end < all.len() {
            page["nextPageToken"] = json!(end.to_string());
        }
        Ok(parse(page))
    }

    async fn videos(&self, video_ids: &[String]) -> Result<VideoListResponse, HttpFailure> {
        self.calls.borrow_mut().videos += 1;
        self.video_batches.borrow_mut().push(video_ids.len());
        self.check()?;
        assert!(video_ids.len() <= 50, "videos.list accepts at most 50 ids");

        let items: Vec<Video> = video_ids
            .iter()
            .filter_map(|id| self.videos.get(id))
            .map(|video| parse(video.clone()))
            .collect();
        Ok(VideoListResponse {
            items,
            ..Default::default()
        })
    }
}

/// Caption tracks and their contents, per video.
#[derive(Debug, Default)]
pub(crate) struct FakeCaptions {
    tracks: HashMap<String, Vec<(String, String)>>,
    contents: HashMap<String, String>,
    fail_listing: bool,
    fail_downloads: bool,
    pub downloads: RefCell<Vec<(String, String)>>,
}

impl FakeCaptions {
    pub fn with_track(mut self, video_id: &str, caption_id: &str, language: &str, text: &str) -> Self {
        self.tracks
            .entry(video_id.into())
            .or_default()
            .push((caption_id.into(), language.into()));
        self.contents.insert(caption_id.into(), text.into());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_downloads(mut self) -> Self {
        self.fail_downloads = true;
        self
    }
}

impl CaptionApi for FakeCaptions {
    async fn list_captions(&self, video_id: &str) -> Result<CaptionListResponse, HttpFailure> {
        if self.fail_listing {
            return Err(google_error(403, "forbidden"));
        }
        let items: Vec<_> = self
            .tracks
            .get(video_id)
            .into_iter()
            .flatten()
            .map(|(id, language)| json!({ "id": id, "snippet": { "language": language, "trackKind": "standard" } }))
            .collect();
        Ok(parse(json!({ "items": items })))
    }

    async fn download_caption(&self, caption_id: &str, format: &str) -> Result<String, HttpFailure> {
        self.downloads
            .borrow_mut()
            .push((caption_id.to_string(), format.to_string()));
        if self.fail_downloads {
            return Err(google_error(403, "forbidden"));
        }
        self.contents
            .get(caption_id)
            .cloned()
            .ok_or_else(|| google_error(404, "captionNotFound"))
    }
}

/// A spreadsheet with worksheet titles and a first column.
#[derive(Debug, Default)]
pub(crate) struct FakeSheets {
    titles: Vec<String>,
    column: Vec<Vec<String>>,
    fail_metadata: bool,
    fail_values: bool,
    fail_append: bool,
    pub read_ranges: RefCell<Vec<String>>,
    pub appended: RefCell<Vec<(String, Vec<Vec<String>>)>>,
}

impl FakeSheets {
    pub fn with_titles(mut self, titles: &[&str]) -> Self {
        self.titles = titles.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_column(mut self, rows: &[&[&str]]) -> Self {
        self.column = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub fn failing_values(mut self) -> Self {
        self.fail_values = true;
        self
    }

    pub fn failing_append(mut self) -> Self {
        self.fail_append = true;
        self
    }
}

impl SheetsApi for FakeSheets {
    async fn sheet_titles(&self, _spreadsheet_id: &str) -> Result<Vec<String>, HttpFailure> {
        if self.fail_metadata {
            return Err(HttpFailure::new(403, r#"{"error": {"code": 403, "status": "PERMISSION_DENIED"}}"#));
        }
        Ok(self.titles.clone())
    }

    async fn values(&self, _spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, HttpFailure> {
        self.read_ranges.borrow_mut().push(range.to_string());
        if self.fail_values {
            return Err(HttpFailure::new(400, "Unable to parse range"));
        }
        Ok(self.column.clone())
    }

    async fn append_rows(
        &self,
        _spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), HttpFailure> {
        if self.fail_append {
            return Err(HttpFailure::new(403, "The caller does not have permission"));
        }
        self.appended
            .borrow_mut()
            .push((range.to_string(), rows.to_vec()));
        Ok(())
    }
}

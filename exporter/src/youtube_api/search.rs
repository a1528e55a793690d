//! YouTube Search API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
}

/// A search result that points at a YouTube resource.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Option<SearchResultId>,
    pub snippet: Option<SearchResultSnippet>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultId {
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultSnippet {
    /// The ID of the channel that published the resource.
    ///
    /// For `type=channel` searches this is the channel itself.
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    pub title: Option<String>,
}

impl SearchResult {
    /// The channel this result refers to.
    pub fn channel_id(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .and_then(|s| s.channel_id.as_deref())
            .or_else(|| self.id.as_ref().and_then(|id| id.channel_id.as_deref()))
    }
}

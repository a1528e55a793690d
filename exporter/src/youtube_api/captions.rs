//! YouTube Captions API types.

use serde::{Deserialize, Serialize};

/// Response structure for the `captions.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/captions/list>
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CaptionListResponse {
    #[serde(default)]
    pub items: Vec<Caption>,
}

/// A `caption` resource represents one caption track of a video.
///
/// See: <https://developers.google.com/youtube/v3/docs/captions#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Caption {
    pub id: String,
    pub snippet: Option<CaptionSnippet>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionSnippet {
    /// BCP-47 language tag of the track, e.g. `en` or `de`.
    pub language: Option<String>,
    /// Whether this is an automatic speech recognition track (`ASR`) or not.
    #[serde(rename = "trackKind")]
    pub track_kind: Option<String>,
    pub name: Option<String>,
}

//! Best-effort caption download.
//!
//! Transcripts are optional: without an authorized session, or when anything
//! about listing or downloading captions fails, a video simply gets an empty
//! transcript and the export carries on.

use crate::youtube_api::{Caption, CaptionApi};

/// Languages preferred when a video has several caption tracks.
pub const DEFAULT_PREFERRED_LANGUAGES: &[&str] = &["en", "de"];

/// Subtitle format requested from `captions.download`.
const CAPTION_FORMAT: &str = "srt";

/// A caption track as far as track selection is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub id: String,
    pub language: String,
}

impl From<Caption> for CaptionTrack {
    fn from(caption: Caption) -> Self {
        Self {
            language: caption
                .snippet
                .and_then(|snippet| snippet.language)
                .unwrap_or_default(),
            id: caption.id,
        }
    }
}

/// Picks the track to download.
///
/// Tracks in a preferred language rank before all others; within a rank the
/// API's order is kept, so the first listed track wins a tie.
pub fn select_track<'a, S: AsRef<str>>(
    tracks: &'a [CaptionTrack],
    preferred_languages: &[S],
) -> Option<&'a CaptionTrack> {
    let score = |track: &CaptionTrack| {
        let preferred = preferred_languages
            .iter()
            .any(|lang| lang.as_ref() == track.language);
        if preferred { 0 } else { 1 }
    };

    let mut ranked: Vec<&CaptionTrack> = tracks.iter().collect();
    // sort_by_key is stable
    ranked.sort_by_key(|track| score(track));
    ranked.into_iter().next()
}

/// Downloads the best caption track of `video_id` as trimmed SRT text.
///
/// Returns an empty string when there is no session, no caption track, or any
/// failure along the way.
pub async fn transcript<S: AsRef<str>>(
    session: Option<&impl CaptionApi>,
    video_id: &str,
    preferred_languages: &[S],
) -> String {
    let Some(session) = session else {
        return String::new();
    };

    let Ok(response) = session.list_captions(video_id).await else {
        return String::new();
    };
    let tracks: Vec<CaptionTrack> = response.items.into_iter().map(CaptionTrack::from).collect();
    let Some(track) = select_track(&tracks, preferred_languages) else {
        return String::new();
    };

    match session.download_caption(&track.id, CAPTION_FORMAT).await {
        Ok(text) => text.trim().to_string(),
        Err(_) => String::new(),
    }
}

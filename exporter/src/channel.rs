//! Turning whatever the user typed into a canonical channel ID.

use crate::error::{ExportError, classify};
use crate::youtube_api::YouTubeApi;
use regex::Regex;
use std::sync::LazyLock;

const RESOLVE_CONTEXT: &str = "resolving channel id";

static BARE_CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[a-zA-Z0-9_-]{20,}$").expect("valid regex"));
static HANDLE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com|youtu\.be)/(@[A-Za-z0-9_.-]+)").expect("valid regex")
});
static CHANNEL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"youtube\.com/channel/(UC[a-zA-Z0-9_-]{20,})").expect("valid regex")
});
static USER_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/user/([A-Za-z0-9_.-]+)").expect("valid regex"));
static CUSTOM_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/c/([A-Za-z0-9_.-]+)").expect("valid regex"));

/// A channel reference, classified by how it has to be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelReference {
    /// Already a canonical `UC…` channel ID.
    ById(String),
    /// An `@handle`, with the `@` kept.
    ByHandle(String),
    /// A legacy username, or free text of unknown shape.
    ByUsername(String),
    /// A legacy `/c/<slug>` custom URL slug.
    ByCustomUrl(String),
}

impl ChannelReference {
    /// Classifies a channel URL, handle, username or ID.
    ///
    /// The first matching rule wins:
    ///
    /// 1. `@handle`
    /// 2. a bare `UC…` channel ID
    /// 3. a `youtube.com/@handle` URL
    /// 4. a `youtube.com/channel/UC…` URL
    /// 5. a `youtube.com/user/<name>` URL
    /// 6. a `youtube.com/c/<name>` URL
    /// 7. anything else is tried as a legacy username
    ///
    /// Parsing never fails; whether the reference exists is only known once it
    /// is resolved.
    pub fn parse(input: &str) -> Self {
        let s = input.trim();

        if s.starts_with('@') {
            return Self::ByHandle(s.to_string());
        }
        if BARE_CHANNEL_ID.is_match(s) {
            return Self::ById(s.to_string());
        }

        let captured = |re: &Regex| re.captures(s).map(|c| c[1].to_string());

        if let Some(handle) = captured(&HANDLE_URL) {
            Self::ByHandle(handle)
        } else if let Some(id) = captured(&CHANNEL_URL) {
            Self::ById(id)
        } else if let Some(username) = captured(&USER_URL) {
            Self::ByUsername(username)
        } else if let Some(slug) = captured(&CUSTOM_URL) {
            Self::ByCustomUrl(slug)
        } else {
            Self::ByUsername(s.to_string())
        }
    }
}

/// Resolves a [`ChannelReference`] to a canonical channel ID.
///
/// IDs are returned as-is without a network call. Handles and usernames use
/// the dedicated `channels.list` lookups. A username that the lookup doesn't
/// know (common for channels that moved to handles) falls back to a channel
/// search, as do custom URLs, which have no lookup endpoint at all. The search
/// fallback trusts the top hit.
pub async fn resolve_channel_id(
    api: &impl YouTubeApi,
    reference: &ChannelReference,
) -> Result<String, ExportError> {
    match reference {
        ChannelReference::ById(id) => Ok(id.clone()),
        ChannelReference::ByHandle(handle) => {
            let response = api
                .channels_by_handle(handle)
                .await
                .map_err(|e| classify(&e, RESOLVE_CONTEXT))?;
            response
                .items
                .into_iter()
                .next()
                .map(|channel| channel.id)
                .ok_or_else(|| ExportError::generic("Channel not found for handle"))
        }
        ChannelReference::ByUsername(username) => {
            let response = api
                .channels_by_username(username)
                .await
                .map_err(|e| classify(&e, RESOLVE_CONTEXT))?;
            if let Some(channel) = response.items.into_iter().next() {
                return Ok(channel.id);
            }

            search_top_channel(api, username)
                .await?
                .ok_or_else(|| ExportError::generic("Channel not found"))
        }
        ChannelReference::ByCustomUrl(slug) => search_top_channel(api, slug)
            .await?
            .ok_or_else(|| ExportError::generic("Channel not found for custom url")),
    }
}

async fn search_top_channel(
    api: &impl YouTubeApi,
    query: &str,
) -> Result<Option<String>, ExportError> {
    let response = api
        .search_channels(query, 1)
        .await
        .map_err(|e| classify(&e, RESOLVE_CONTEXT))?;
    Ok(response
        .items
        .first()
        .and_then(|result| result.channel_id())
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeYouTube;
    use pretty_assertions::assert_eq;

    const ID: &str = "UCabcdefghijklmnopqrstuv";

    #[test]
    fn handles_keep_their_at() {
        for input in ["@example", "  @example  ", "@some.name_with-chars", "@x"] {
            assert_eq!(
                ChannelReference::parse(input),
                ChannelReference::ByHandle(input.trim().to_string())
            );
        }
    }

    #[test]
    fn bare_ids() {
        assert_eq!(ChannelReference::parse(ID), ChannelReference::ById(ID.into()));
        assert_eq!(
            ChannelReference::parse("UC_x5XG1OV2P6uZZ5FSM9Ttw"),
            ChannelReference::ById("UC_x5XG1OV2P6uZZ5FSM9Ttw".into())
        );
        // too short to be an ID
        assert_eq!(
            ChannelReference::parse("UCshort"),
            ChannelReference::ByUsername("UCshort".into())
        );
    }

    #[test]
    fn urls() {
        assert_eq!(
            ChannelReference::parse("https://www.youtube.com/@example/videos"),
            ChannelReference::ByHandle("@example".into())
        );
        assert_eq!(
            ChannelReference::parse("youtu.be/@short.handle"),
            ChannelReference::ByHandle("@short.handle".into())
        );
        assert_eq!(
            ChannelReference::parse(&format!("https://youtube.com/channel/{ID}")),
            ChannelReference::ById(ID.into())
        );
        assert_eq!(
            ChannelReference::parse("https://www.youtube.com/user/LegacyName"),
            ChannelReference::ByUsername("LegacyName".into())
        );
        assert_eq!(
            ChannelReference::parse("https://www.youtube.com/c/SomeSlug"),
            ChannelReference::ByCustomUrl("SomeSlug".into())
        );
    }

    #[test]
    fn free_text_is_a_username() {
        assert_eq!(
            ChannelReference::parse("  some channel  "),
            ChannelReference::ByUsername("some channel".into())
        );
        assert_eq!(
            ChannelReference::parse("https://example.com/channel/x"),
            ChannelReference::ByUsername("https://example.com/channel/x".into())
        );
    }

    #[tokio::test]
    async fn ids_resolve_without_network() {
        let api = FakeYouTube::default();
        let id = resolve_channel_id(&api, &ChannelReference::ById(ID.into()))
            .await
            .unwrap();
        assert_eq!(id, ID);
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn handle_lookup() {
        let api = FakeYouTube::default().with_handle("@example", ID);
        let id = resolve_channel_id(&api, &ChannelReference::ByHandle("@example".into()))
            .await
            .unwrap();
        assert_eq!(id, ID);

        let err = resolve_channel_id(&api, &ChannelReference::ByHandle("@missing".into()))
            .await
            .unwrap_err();
        assert_eq!(err, ExportError::generic("Channel not found for handle"));
    }

    #[tokio::test]
    async fn username_hit_skips_search() {
        let api = FakeYouTube::default()
            .with_username("legacy", ID)
            .with_search("legacy", "UCwrongwrongwrongwrongwr");
        let id = resolve_channel_id(&api, &ChannelReference::ByUsername("legacy".into()))
            .await
            .unwrap();
        assert_eq!(id, ID);
        assert_eq!(api.calls.borrow().username, 1);
        assert_eq!(api.calls.borrow().search, 0);
    }

    #[tokio::test]
    async fn username_miss_falls_back_to_search() {
        let api = FakeYouTube::default().with_search("migrated", ID);
        let id = resolve_channel_id(&api, &ChannelReference::ByUsername("migrated".into()))
            .await
            .unwrap();
        assert_eq!(id, ID);
        assert_eq!(api.calls.borrow().username, 1);
        assert_eq!(api.calls.borrow().search, 1);

        let err = resolve_channel_id(&api, &ChannelReference::ByUsername("nobody".into()))
            .await
            .unwrap_err();
        assert_eq!(err, ExportError::generic("Channel not found"));
        assert_eq!(api.calls.borrow().search, 2);
    }

    #[tokio::test]
    async fn custom_url_goes_straight_to_search() {
        let api = FakeYouTube::default().with_search("SomeSlug", ID);
        let id = resolve_channel_id(&api, &ChannelReference::ByCustomUrl("SomeSlug".into()))
            .await
            .unwrap();
        assert_eq!(id, ID);
        assert_eq!(api.calls.borrow().username, 0);

        let err = resolve_channel_id(&api, &ChannelReference::ByCustomUrl("Nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err, ExportError::generic("Channel not found for custom url"));
    }

    #[tokio::test]
    async fn lookup_failures_are_classified() {
        let api = FakeYouTube::default().failing_with(403, "quotaExceeded");
        let err = resolve_channel_id(&api, &ChannelReference::ByHandle("@example".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::QuotaExceeded(_)));

        let api = FakeYouTube::default().failing_with(400, "invalidParameter");
        let err = resolve_channel_id(&api, &ChannelReference::ByUsername("x".into()))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "API error while resolving channel id. Status 400. Reason invalidParameter"
        );
    }
}

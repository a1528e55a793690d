//! The export pipeline, from channel reference to written rows.

use crate::channel::{ChannelReference, resolve_channel_id};
use crate::config::ExportConfig;
use crate::csv_export::write_csv;
use crate::details::{VideoRecord, video_details};
use crate::error::ExportError;
use crate::oauth::{OAuthSessionProvider, SessionProvider};
use crate::sheets::{SheetsApi, SheetsClient, SheetsWriter, service_account_email};
use crate::transcript::transcript;
use crate::uploads::{list_upload_video_ids, uploads_playlist_id};
use crate::youtube_api::{CaptionApi, YouTubeApi, YouTubeClient};
use std::collections::HashSet;
use std::path::Path;

/// Progress of an export, reported as it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent<'a> {
    Started {
        channel_input: &'a str,
        max_videos: u32,
        transcripts: bool,
    },
    ChannelResolved {
        channel_id: &'a str,
    },
    UploadsPlaylistFound {
        playlist_id: &'a str,
    },
    VideoIdsListed {
        count: usize,
    },
    DetailsFetched {
        count: usize,
    },
    ExistingUrlsLoaded {
        count: usize,
    },
    RowsFiltered {
        kept: usize,
    },
    CsvWritten {
        path: &'a Path,
    },
    SheetUpdated {
        spreadsheet_id: &'a str,
        rows: usize,
    },
    Finished {
        records: usize,
    },
}

/// Receives [`ExportEvent`]s from [`run_export`].
pub trait ExportEvents {
    fn emit(&self, event: ExportEvent<'_>);
}

/// Forwards every event to `tracing` at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl ExportEvents for TracingEvents {
    fn emit(&self, event: ExportEvent<'_>) {
        match event {
            ExportEvent::Started {
                channel_input,
                max_videos,
                transcripts,
            } => {
                tracing::info!(channel_input, max_videos, transcripts, "starting export");
                if !transcripts {
                    tracing::info!(
                        "no OAuth client secrets given; transcripts will be left empty"
                    );
                }
            }
            ExportEvent::ChannelResolved { channel_id } => {
                tracing::info!(channel_id, "resolved channel id")
            }
            ExportEvent::UploadsPlaylistFound { playlist_id } => {
                tracing::info!(playlist_id, "found uploads playlist")
            }
            ExportEvent::VideoIdsListed { count } => tracing::info!(count, "listed video ids"),
            ExportEvent::DetailsFetched { count } => {
                tracing::info!(count, "fetched video details")
            }
            ExportEvent::ExistingUrlsLoaded { count } => {
                tracing::info!(count, "loaded video links already in the sheet")
            }
            ExportEvent::RowsFiltered { kept } => tracing::info!(kept, "rows after filtering"),
            ExportEvent::CsvWritten { path } => {
                tracing::info!(path = %path.display(), "wrote CSV")
            }
            ExportEvent::SheetUpdated {
                spreadsheet_id,
                rows,
            } => tracing::info!(spreadsheet_id, rows, "updated Google Sheet"),
            ExportEvent::Finished { records } => tracing::info!(records, "export finished"),
        }
    }
}

/// Runs one export against already-built collaborators.
///
/// `captions` enables transcripts; `sheets` is the append target and, with
/// `skip_existing`, the source of links to leave out. Records are returned in
/// the order they were written.
pub async fn run_export<C, S>(
    config: &ExportConfig,
    youtube: &impl YouTubeApi,
    captions: Option<&C>,
    sheets: Option<&SheetsWriter<S>>,
    events: &impl ExportEvents,
) -> Result<Vec<VideoRecord>, ExportError>
where
    C: CaptionApi,
    S: SheetsApi,
{
    events.emit(ExportEvent::Started {
        channel_input: &config.channel_input,
        max_videos: config.max_videos,
        transcripts: captions.is_some(),
    });

    let reference = ChannelReference::parse(&config.channel_input);
    let channel_id = resolve_channel_id(youtube, &reference).await?;
    events.emit(ExportEvent::ChannelResolved {
        channel_id: &channel_id,
    });

    let playlist_id = uploads_playlist_id(youtube, &channel_id).await?;
    events.emit(ExportEvent::UploadsPlaylistFound {
        playlist_id: &playlist_id,
    });

    let video_ids = list_upload_video_ids(youtube, &playlist_id, config.max_videos).await?;
    events.emit(ExportEvent::VideoIdsListed {
        count: video_ids.len(),
    });

    let details = video_details(youtube, &video_ids).await?;
    events.emit(ExportEvent::DetailsFetched {
        count: details.len(),
    });

    let existing = match sheets {
        Some(writer) if config.skip_existing => {
            let urls = writer.existing_video_urls().await;
            events.emit(ExportEvent::ExistingUrlsLoaded { count: urls.len() });
            urls
        }
        _ => HashSet::new(),
    };

    let mut records = Vec::with_capacity(details.len());
    for mut record in details {
        if existing.contains(&record.video_url) {
            continue;
        }
        record.transcript =
            transcript(captions, record.video_id(), &config.transcript_languages).await;
        records.push(record);
    }
    events.emit(ExportEvent::RowsFiltered {
        kept: records.len(),
    });

    if let Some(path) = &config.out_csv {
        write_csv(path, &records).map_err(|e| {
            ExportError::Generic(format!("Failed to write CSV {}: {e:#}", path.display()))
        })?;
        events.emit(ExportEvent::CsvWritten { path });
    }

    if let Some(writer) = sheets {
        writer.append(&records).await?;
        events.emit(ExportEvent::SheetUpdated {
            spreadsheet_id: writer.spreadsheet_id(),
            rows: records.len(),
        });
    }

    events.emit(ExportEvent::Finished {
        records: records.len(),
    });
    Ok(records)
}

/// Builds the real API clients for `config` and runs the export.
///
/// Asks for an OAuth session first when client secrets are configured, which
/// may open a browser.
pub async fn run_with_config(config: &ExportConfig) -> eyre::Result<Vec<VideoRecord>> {
    let http = reqwest::Client::new();
    let youtube = YouTubeClient::with_api_key(&config.api_key, http.clone());

    let session = match &config.oauth_client_secrets {
        Some(client_secrets) => {
            let provider =
                OAuthSessionProvider::new(client_secrets, &config.token_path, http.clone());
            Some(provider.obtain_session().await?)
        }
        None => None,
    };

    let sheets = match config.sheet_target() {
        Some((key_path, spreadsheet_id, worksheet)) => {
            let client = SheetsClient::from_service_account(key_path, http.clone()).await?;
            Some(SheetsWriter::new(
                client,
                spreadsheet_id,
                worksheet,
                service_account_email(key_path),
            ))
        }
        None => None,
    };

    let records = run_export(
        config,
        &youtube,
        session.as_ref(),
        sheets.as_ref(),
        &TracingEvents,
    )
    .await?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::watch_url;
    use crate::testing::{FakeCaptions, FakeSheets, FakeYouTube, video_json};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    const CHANNEL: &str = "UCabcdefghijklmnopqrstuv";

    #[derive(Default)]
    struct RecordedEvents(RefCell<Vec<String>>);

    impl ExportEvents for RecordedEvents {
        fn emit(&self, event: ExportEvent<'_>) {
            self.0.borrow_mut().push(format!("{event:?}"));
        }
    }

    fn example_channel() -> FakeYouTube {
        FakeYouTube::default()
            .with_handle("@example", CHANNEL)
            .with_uploads(
                CHANNEL,
                "UUabcdefghijklmnopqrstuv",
                vec!["vidA".into(), "vidB".into(), "vidC".into()],
            )
            .with_video(video_json("vidA", "First", "2024-02-01T10:00:00Z", "100"))
            .with_video(video_json("vidB", "Second", "2024-01-15T08:30:00Z", "5"))
            .with_video(video_json("vidC", "Third", "2023-12-31T23:59:59Z", "0"))
    }

    fn config(max_videos: u32) -> ExportConfig {
        ExportConfig {
            max_videos,
            ..ExportConfig::new("key", "@example")
        }
    }

    #[tokio::test]
    async fn exports_handle_without_session() {
        let youtube = example_channel();
        let events = RecordedEvents::default();

        let records = run_export(
            &config(2),
            &youtube,
            None::<&FakeCaptions>,
            None::<&SheetsWriter<FakeSheets>>,
            &events,
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].video_url, watch_url("vidA"));
        assert_eq!(records[0].title, "First");
        assert_eq!(records[0].posted_date, "2024-02-01");
        assert_eq!(records[0].view_count, "100");
        assert_eq!(records[0].thumbnail_url, "https://i.ytimg.com/vi/vidA/hqdefault.jpg");
        assert_eq!(records[1].posted_date, "2024-01-15");
        assert!(records.iter().all(|r| r.transcript.is_empty()));
        assert_eq!(*youtube.page_sizes.borrow(), vec![2]);

        let events = events.0.borrow();
        assert!(events.first().unwrap().starts_with("Started"));
        assert!(events.iter().any(|e| e.contains(CHANNEL)));
        assert!(events.last().unwrap().contains("Finished { records: 2 }"));
    }

    #[tokio::test]
    async fn transcripts_come_from_the_session() {
        let youtube = example_channel();
        let captions = FakeCaptions::default().with_track("vidB", "capB", "de", " hallo ");

        let records = run_export(
            &config(3),
            &youtube,
            Some(&captions),
            None::<&SheetsWriter<FakeSheets>>,
            &RecordedEvents::default(),
        )
        .await
        .unwrap();

        let transcripts: Vec<&str> = records.iter().map(|r| r.transcript.as_str()).collect();
        assert_eq!(transcripts, vec!["", "hallo", ""]);
    }

    #[tokio::test]
    async fn skips_links_already_in_the_sheet() {
        let youtube = example_channel();
        let sheets = FakeSheets::default()
            .with_titles(&["Example"])
            .with_column(&[
                &["YouTube Video Link"],
                &[" https://www.youtube.com/watch?v=vidB "],
            ]);
        let writer = SheetsWriter::new(&sheets, "sheet-1", "Example", None);
        let config = ExportConfig {
            skip_existing: true,
            ..config(3)
        };

        let records = run_export(
            &config,
            &youtube,
            None::<&FakeCaptions>,
            Some(&writer),
            &RecordedEvents::default(),
        )
        .await
        .unwrap();

        let urls: Vec<&str> = records.iter().map(|r| r.video_url.as_str()).collect();
        assert_eq!(urls, vec![watch_url("vidA"), watch_url("vidC")]);
        assert_eq!(*sheets.read_ranges.borrow(), vec!["Example!A:A"]);

        let appended = sheets.appended.borrow();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].0, "Example!A1");
        // header plus two rows
        assert_eq!(appended[0].1.len(), 3);
    }

    #[tokio::test]
    async fn existing_links_are_ignored_without_skip_existing() {
        let youtube = example_channel();
        let sheets = FakeSheets::default()
            .with_titles(&["Example"])
            .with_column(&[&["https://www.youtube.com/watch?v=vidB"]]);
        let writer = SheetsWriter::new(&sheets, "sheet-1", "Example", None);

        let records = run_export(
            &config(3),
            &youtube,
            None::<&FakeCaptions>,
            Some(&writer),
            &RecordedEvents::default(),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 3);
        assert!(sheets.read_ranges.borrow().is_empty());
    }

    #[tokio::test]
    async fn missing_worksheet_aborts_after_csv() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("videos.csv");
        let youtube = example_channel();
        let sheets = FakeSheets::default().with_titles(&["Sheet1"]);
        let writer = SheetsWriter::new(&sheets, "sheet-1", "Example", None);
        let config = ExportConfig {
            out_csv: Some(out.clone()),
            ..config(1)
        };

        let err = run_export(
            &config,
            &youtube,
            None::<&FakeCaptions>,
            Some(&writer),
            &RecordedEvents::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            ExportError::SheetNotFound(
                "Worksheet \"Example\" not found. Available worksheets: Sheet1".into()
            )
        );
        assert!(sheets.appended.borrow().is_empty());
        let csv = std::fs::read_to_string(&out).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[tokio::test]
    async fn quota_errors_abort_the_export() {
        let youtube = FakeYouTube::default().failing_with(403, "quotaExceeded");
        let events = RecordedEvents::default();

        let err = run_export(
            &config(5),
            &youtube,
            None::<&FakeCaptions>,
            None::<&SheetsWriter<FakeSheets>>,
            &events,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ExportError::QuotaExceeded(_)));
        assert_eq!(events.0.borrow().len(), 1);
    }
}

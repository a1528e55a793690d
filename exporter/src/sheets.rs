//! Google Sheets output.
//!
//! Rows are appended to an existing worksheet using a service account. Before
//! anything is written the worksheet must exist; access problems are reported
//! with the service account's email so the user knows whom to share the sheet
//! with.

#![allow(async_fn_in_trait)]

use crate::details::VideoRecord;
use crate::error::{ExportError, HttpFailure};
use eyre::{Context, OptionExt};
use http::Method;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::instrument;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Header row written at the start of every append.
pub const SHEET_HEADERS: [&str; 6] = [
    "YouTube Video Link",
    "Thumbnail",
    "Title",
    "Posted Date",
    "Views Count",
    "Transcript",
];

static QUERY_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]v=([A-Za-z0-9_-]+)").expect("valid regex"));
static SHORTS_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/shorts/([A-Za-z0-9_-]+)").expect("valid regex"));
static ID_SHAPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{6,}$").expect("valid regex"));

/// Spreadsheet endpoints the writer needs.
pub trait SheetsApi {
    /// Titles of all worksheets in the spreadsheet.
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, HttpFailure>;

    /// Cell values of `range`, row by row, as displayed.
    async fn values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, HttpFailure>;

    /// Appends `rows` after the table found at `range`, inserting new rows and
    /// interpreting values as if typed by a user (so formulas evaluate).
    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), HttpFailure>;
}

impl<T: SheetsApi> SheetsApi for &T {
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, HttpFailure> {
        (**self).sheet_titles(spreadsheet_id).await
    }

    async fn values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, HttpFailure> {
        (**self).values(spreadsheet_id, range).await
    }

    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), HttpFailure> {
        (**self).append_rows(spreadsheet_id, range, rows).await
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: Option<SheetProperties>,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: &'a [Vec<String>],
}

/// Sheets API v4 client authorized with a bearer token.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    access_token: String,
    client: reqwest::Client,
}

impl SheetsClient {
    pub fn new(access_token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            access_token: access_token.into(),
            client,
        }
    }

    /// Authorizes as the service account whose JSON key is at `key_path`.
    ///
    /// The token is fetched once; an export finishes well within its lifetime.
    #[instrument(skip(client))]
    pub async fn from_service_account(
        key_path: &Path,
        client: reqwest::Client,
    ) -> eyre::Result<Self> {
        let key = yup_oauth2::read_service_account_key(key_path)
            .await
            .with_context(|| format!("read service account key {}", key_path.display()))?;
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("build service account authenticator")?;
        let token = auth
            .token(&[SHEETS_SCOPE])
            .await
            .context("obtain Sheets access token")?;
        let access_token = token
            .token()
            .ok_or_eyre("service account token response had no access token")?;

        tracing::debug!("obtained Sheets access token");
        Ok(Self::new(access_token, client))
    }

    /// `https://sheets.googleapis.com/v4/spreadsheets/<id>/<segments…>`, percent-encoded.
    fn url(&self, spreadsheet_id: &str, segments: &[&str]) -> Result<Url, HttpFailure> {
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| HttpFailure::transport(format!("build Sheets URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| HttpFailure::transport("Sheets base URL cannot have a path"))?
            .push(spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        query_params: &[(&str, &str)],
        json_body: Option<&impl Serialize>,
    ) -> Result<reqwest::Response, HttpFailure> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .query(query_params);
        if let Some(body) = json_body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            tracing::debug!(status = status_code.as_u16(), "Sheets API request failed");
            return Err(HttpFailure::new(status_code.as_u16(), error_text));
        }
        Ok(response)
    }
}

impl SheetsApi for SheetsClient {
    /// See: <https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets/get>
    #[instrument(skip(self))]
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, HttpFailure> {
        let url = self.url(spreadsheet_id, &[])?;
        let response = self
            .send(
                Method::GET,
                url,
                &[("fields", "sheets.properties.title")],
                None::<&()>,
            )
            .await?;
        let metadata: SpreadsheetMetadata = response.json().await?;

        Ok(metadata
            .sheets
            .into_iter()
            .filter_map(|sheet| sheet.properties?.title)
            .filter(|title| !title.is_empty())
            .collect())
    }

    /// See: <https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values/get>
    #[instrument(skip(self))]
    async fn values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, HttpFailure> {
        let url = self.url(spreadsheet_id, &["values", range])?;
        let response = self.send(Method::GET, url, &[], None::<&()>).await?;
        let range: ValueRange = response.json().await?;

        Ok(range
            .values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect())
    }

    /// See: <https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values/append>
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), HttpFailure> {
        let url = self.url(spreadsheet_id, &["values", &format!("{range}:append")])?;
        let query_params = [
            ("valueInputOption", "USER_ENTERED"),
            ("insertDataOption", "INSERT_ROWS"),
        ];
        self.send(
            Method::POST,
            url,
            &query_params,
            Some(&AppendBody { values: rows }),
        )
        .await?;

        tracing::debug!(spreadsheet_id, range, "appended rows");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ServiceAccountEmail {
    client_email: Option<String>,
}

/// `client_email` of a service account key file, if the file can be read.
pub fn service_account_email(key_path: &Path) -> Option<String> {
    let json = std::fs::read_to_string(key_path).ok()?;
    serde_json::from_str::<ServiceAccountEmail>(&json)
        .ok()?
        .client_email
        .filter(|email| !email.is_empty())
}

/// Extracts a video ID from a YouTube URL.
///
/// Tries a `v=` query parameter, then a `/shorts/<id>` path, then a last path
/// segment that looks like an ID. Returns `""` if none match.
pub fn video_id_from_url(url: &str) -> &str {
    if let Some(c) = QUERY_VIDEO_ID.captures(url) {
        return c.get(1).map_or("", |m| m.as_str());
    }
    if let Some(c) = SHORTS_VIDEO_ID.captures(url) {
        return c.get(1).map_or("", |m| m.as_str());
    }

    let path = url.split(['?', '#']).next().unwrap_or_default();
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    if ID_SHAPED.is_match(last) { last } else { "" }
}

/// The `=IMAGE(...)` cell for a record's thumbnail.
///
/// Uses the stable `hqdefault.jpg` URL derived from the video ID, falls back to
/// the record's own thumbnail URL, and is empty when neither exists.
pub fn thumbnail_formula(record: &VideoRecord) -> String {
    let video_id = video_id_from_url(&record.video_url);
    let url = if !video_id.is_empty() {
        format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg")
    } else if !record.thumbnail_url.is_empty() {
        record.thumbnail_url.clone()
    } else {
        return String::new();
    };
    format!("=IMAGE(\"{url}\")")
}

/// The rows appended for `records`: the header row, then one row per record.
pub fn sheet_rows(records: &[VideoRecord]) -> Vec<Vec<String>> {
    let header = SHEET_HEADERS.iter().map(|h| h.to_string()).collect();
    std::iter::once(header)
        .chain(records.iter().map(|r| {
            vec![
                r.video_url.clone(),
                thumbnail_formula(r),
                r.title.clone(),
                r.posted_date.clone(),
                r.view_count.clone(),
                r.transcript.clone(),
            ]
        }))
        .collect()
}

/// A worksheet to write to, and how to reach it.
#[derive(Debug, Clone)]
pub struct SheetsWriter<S> {
    api: S,
    spreadsheet_id: String,
    worksheet: String,
    /// Service account email, used in permission hints.
    client_email: Option<String>,
}

impl<S: SheetsApi> SheetsWriter<S> {
    pub fn new(
        api: S,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
        client_email: Option<String>,
    ) -> Self {
        Self {
            api,
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            client_email,
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn share_hint(&self) -> String {
        match &self.client_email {
            Some(email) => {
                format!(" Share the Google Sheet with this service account as Editor: {email}")
            }
            None => String::new(),
        }
    }

    /// Video URLs already present in column A.
    ///
    /// Only cells that look like URLs count. If the column can't be read the
    /// set is empty, so nothing gets skipped.
    pub async fn existing_video_urls(&self) -> HashSet<String> {
        let range = format!("{}!A:A", self.worksheet);
        let Ok(rows) = self.api.values(&self.spreadsheet_id, &range).await else {
            return HashSet::new();
        };

        rows.into_iter()
            .filter_map(|row| row.into_iter().next())
            .map(|cell| cell.trim().to_string())
            .filter(|cell| cell.starts_with("http"))
            .collect()
    }

    /// Fails unless the target worksheet exists.
    pub async fn ensure_worksheet_exists(&self) -> Result<(), ExportError> {
        let titles = self
            .api
            .sheet_titles(&self.spreadsheet_id)
            .await
            .map_err(|_| {
                ExportError::PermissionDenied(format!(
                    "Cannot access spreadsheet metadata.{}",
                    self.share_hint()
                ))
            })?;

        if titles.iter().any(|title| *title == self.worksheet) {
            return Ok(());
        }

        let available = if titles.is_empty() {
            "(none)".to_string()
        } else {
            titles.join(", ")
        };
        Err(ExportError::SheetNotFound(format!(
            "Worksheet \"{}\" not found. Available worksheets: {available}",
            self.worksheet
        )))
    }

    /// Appends a header row and one row per record.
    ///
    /// The worksheet is checked first; nothing is written when it is missing
    /// or inaccessible.
    pub async fn append(&self, records: &[VideoRecord]) -> Result<(), ExportError> {
        let rows = sheet_rows(records);

        self.ensure_worksheet_exists().await?;

        let range = format!("{}!A1", self.worksheet);
        self.api
            .append_rows(&self.spreadsheet_id, &range, &rows)
            .await
            .map_err(|_| {
                ExportError::PermissionDenied(format!(
                    "Permission denied while writing to Google Sheets.{}",
                    self.share_hint()
                ))
            })
    }
}

//! Export settings, as collected by the command line (or any other front end).

use crate::transcript::DEFAULT_PREFERRED_LANGUAGES;
use std::path::PathBuf;

pub const DEFAULT_MAX_VIDEOS: u32 = 25;
pub const DEFAULT_WORKSHEET_NAME: &str = "Example";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Everything one export run needs to know.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// YouTube Data API key for the public read endpoints.
    pub api_key: String,
    /// Channel URL, `@handle`, legacy username or channel ID.
    pub channel_input: String,
    pub max_videos: u32,

    pub out_csv: Option<PathBuf>,

    /// Service account key used to write to Google Sheets.
    pub sheets_service_account_json: Option<PathBuf>,
    pub spreadsheet_id: Option<String>,
    pub worksheet_name: Option<String>,

    /// OAuth client secrets; enables transcript download when set.
    pub oauth_client_secrets: Option<PathBuf>,
    pub token_path: PathBuf,

    /// Leave out videos whose URL is already in the worksheet's first column.
    pub skip_existing: bool,
    /// Caption languages preferred when picking a transcript track.
    pub transcript_languages: Vec<String>,
    pub verbose: bool,
}

impl ExportConfig {
    pub fn new(api_key: impl Into<String>, channel_input: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            channel_input: channel_input.into(),
            max_videos: DEFAULT_MAX_VIDEOS,
            out_csv: None,
            sheets_service_account_json: None,
            spreadsheet_id: None,
            worksheet_name: None,
            oauth_client_secrets: None,
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            skip_existing: false,
            transcript_languages: DEFAULT_PREFERRED_LANGUAGES
                .iter()
                .map(|lang| lang.to_string())
                .collect(),
            verbose: false,
        }
    }

    /// Service account key, spreadsheet and worksheet, when all three are set.
    pub fn sheet_target(&self) -> Option<(&PathBuf, &str, &str)> {
        Some((
            self.sheets_service_account_json.as_ref()?,
            self.spreadsheet_id.as_deref()?,
            self.worksheet_name.as_deref()?,
        ))
    }
}

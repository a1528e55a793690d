use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_exporter::config::{
    DEFAULT_MAX_VIDEOS, DEFAULT_TOKEN_PATH, DEFAULT_WORKSHEET_NAME, ExportConfig,
};
use youtube_exporter::run_with_config;

/// Export YouTube channel video data to CSV and/or Google Sheets.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY")]
    api_key: String,

    /// Channel URL, channel ID, username, or @handle
    #[arg(long, env = "YOUTUBE_CHANNEL")]
    channel: String,

    /// Maximum number of videos to export
    #[arg(long = "max", default_value_t = DEFAULT_MAX_VIDEOS)]
    max_videos: u32,

    /// CSV output path
    #[arg(long)]
    out: Option<PathBuf>,

    /// Google service account JSON key used to write to Sheets
    #[arg(long)]
    sheets_sa: Option<PathBuf>,

    /// Target spreadsheet ID
    #[arg(long)]
    spreadsheet_id: Option<String>,

    /// Worksheet name
    #[arg(long, default_value = DEFAULT_WORKSHEET_NAME)]
    worksheet: String,

    /// OAuth client secrets JSON, enables official caption download
    #[arg(long)]
    oauth_client: Option<PathBuf>,

    /// Where the OAuth token is cached between runs
    #[arg(long, default_value = DEFAULT_TOKEN_PATH)]
    token_path: PathBuf,

    /// Skip videos whose link is already in the worksheet
    #[arg(long)]
    skip_existing: bool,

    /// Preferred caption language, in order (repeatable)
    #[arg(long = "transcript-lang", value_name = "LANG")]
    transcript_languages: Vec<String>,

    /// Verbose logging
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> ExportConfig {
        let defaults = ExportConfig::new(self.api_key, self.channel);
        let non_empty = |s: String| {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        };

        ExportConfig {
            max_videos: self.max_videos,
            out_csv: self.out,
            sheets_service_account_json: self.sheets_sa,
            spreadsheet_id: self.spreadsheet_id.and_then(non_empty),
            worksheet_name: non_empty(self.worksheet),
            oauth_client_secrets: self.oauth_client,
            token_path: self.token_path,
            skip_existing: self.skip_existing,
            transcript_languages: if self.transcript_languages.is_empty() {
                defaults.transcript_languages.clone()
            } else {
                self.transcript_languages
            },
            verbose: self.verbose,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let config = args.into_config();
    match run_with_config(&config).await {
        Ok(_) => {
            println!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

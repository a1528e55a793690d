//! Export the uploads of a YouTube channel to CSV and Google Sheets.
//!
//! [`export::run_with_config`] is the entry point used by the binary. The
//! pipeline itself, [`export::run_export`], only talks to the capability traits
//! in [`youtube_api`] and [`sheets`], so it runs the same against the real
//! clients and against in-memory fakes.

pub mod channel;
pub mod config;
pub mod csv_export;
pub mod details;
pub mod error;
pub mod export;
pub mod oauth;
pub mod sheets;
pub mod transcript;
pub mod uploads;
pub mod youtube_api;

#[cfg(test)]
mod testing;

pub use config::ExportConfig;
pub use details::VideoRecord;
pub use error::ExportError;
pub use export::{run_export, run_with_config};

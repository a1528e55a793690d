//! CSV output.

use crate::details::VideoRecord;
use eyre::Context;
use std::io;
use std::path::Path;

/// Column names, in order.
pub const CSV_HEADERS: [&str; 6] = [
    "video_url",
    "title",
    "thumbnail_url",
    "view_count",
    "posted_date",
    "transcript",
];

/// Writes the header row and one row per record to `writer`.
///
/// The header is written even when there are no records.
pub fn write_records<W: io::Write>(writer: W, records: &[VideoRecord]) -> eyre::Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv.write_record(CSV_HEADERS).context("write CSV header")?;
    for record in records {
        csv.serialize(record)
            .with_context(|| format!("write CSV row for {}", record.video_url))?;
    }
    csv.flush().context("flush CSV output")?;
    Ok(())
}

/// Creates (or truncates) `path` and writes `records` to it.
pub fn write_csv(path: &Path, records: &[VideoRecord]) -> eyre::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create CSV file {}", path.display()))?;
    write_records(file, records)
}

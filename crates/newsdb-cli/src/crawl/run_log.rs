//! Append-only summary log written by batch crawls.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;

/// Formats one run-log entry.
pub(crate) fn format_entry(at: NaiveDateTime, stored: usize, omitted: usize) -> String {
    format!(
        "------------------\n{}\n------------------\n\
         Successfully stored {stored} new article(s) in the database ({omitted} were omitted).\n\n",
        at.format("%Y-%m-%d %H:%M")
    )
}

/// Appends an entry to the run log at `path`, creating the file if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub(crate) fn append_entry(
    path: &Path,
    at: NaiveDateTime,
    stored: usize,
    omitted: usize,
) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("failed to open run log {}: {e}", path.display()))?;
    file.write_all(format_entry(at, stored, omitted).as_bytes())?;
    Ok(())
}

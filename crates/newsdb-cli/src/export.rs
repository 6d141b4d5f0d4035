//! `export-links`: dump stored article URLs for external tools.

use std::io::Write;
use std::path::Path;

use sqlx::SqlitePool;

/// Writes every stored article URL to `output`, one per line, replacing any
/// existing file.
///
/// # Errors
///
/// Returns an error if the query fails or the file cannot be written.
pub(crate) async fn run_export_links(pool: &SqlitePool, output: &Path) -> anyhow::Result<()> {
    let urls = newsdb_db::list_article_urls(pool).await?;
    write_links(output, &urls)?;
    tracing::info!(path = %output.display(), urls = urls.len(), "article links exported");
    println!("wrote {} link(s) to {}", urls.len(), output.display());
    Ok(())
}

fn write_links(output: &Path, urls: &[String]) -> anyhow::Result<()> {
    let file = std::fs::File::create(output)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", output.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    for url in urls {
        writeln!(writer, "{url}")?;
    }
    writer.flush()?;
    Ok(())
}

//! Database operations for `scrape_que`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `scrape_que` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueRow {
    pub url: String,
    pub scrape_time: DateTime<Utc>,
    pub scrape_retries: i64,
}

/// Queues `url` with zero retries. A URL already queued is left untouched.
///
/// Returns `true` when a row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn enqueue_url(
    pool: &SqlitePool,
    url: &str,
    scrape_time: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO scrape_que (url, scrape_time, scrape_retries) \
         VALUES (?1, ?2, 0) \
         ON CONFLICT (url) DO NOTHING",
    )
    .bind(url)
    .bind(scrape_time)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Queues every URL in `urls`, returning how many were new.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn enqueue_urls<I, S>(
    pool: &SqlitePool,
    urls: I,
    scrape_time: DateTime<Utc>,
) -> Result<usize, DbError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut inserted = 0usize;
    for url in urls {
        if enqueue_url(pool, url.as_ref(), scrape_time).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Returns every queued URL, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_queue(pool: &SqlitePool) -> Result<Vec<QueueRow>, DbError> {
    let rows = sqlx::query_as::<_, QueueRow>(
        "SELECT url, scrape_time, scrape_retries \
         FROM scrape_que \
         ORDER BY scrape_time ASC, url ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Bumps the retry counter before a fetch attempt.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the URL is not queued, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn increment_retries(pool: &SqlitePool, url: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_que SET scrape_retries = scrape_retries + 1 WHERE url = ?1",
    )
    .bind(url)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Removes queued URLs that are already stored or excluded.
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn prune_resolved_queue(pool: &SqlitePool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM scrape_que \
         WHERE url IN (SELECT url FROM articles) \
            OR url IN (SELECT url FROM exclude_articles)",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Enqueue time of the most recently queued URL, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn newest_queue_time(pool: &SqlitePool) -> Result<Option<DateTime<Utc>>, DbError> {
    // MAX() over a TEXT column loses the column type; order and take one row.
    let newest = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT scrape_time FROM scrape_que ORDER BY scrape_time DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(newest)
}

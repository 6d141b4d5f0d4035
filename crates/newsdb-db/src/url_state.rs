//! Lifecycle lookups spanning the queue, article store and exclude list.

use std::collections::HashSet;

use newsdb_core::UrlState;
use sqlx::SqlitePool;

use crate::DbError;

/// Returns where `url` currently sits.
///
/// One query covers all three URL tables. If a URL were ever present in
/// more than one, the terminal state wins (stored, then excluded, then queued).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn url_state(pool: &SqlitePool, url: &str) -> Result<UrlState, DbError> {
    let rank: Option<i64> = sqlx::query_scalar(
        "SELECT MIN(rank) FROM ( \
             SELECT 1 AS rank FROM articles WHERE url = ?1 \
             UNION ALL SELECT 2 FROM exclude_articles WHERE url = ?1 \
             UNION ALL SELECT 3 FROM scrape_que WHERE url = ?1 \
         )",
    )
    .bind(url)
    .fetch_one(pool)
    .await?;

    Ok(match rank {
        Some(1) => UrlState::Stored,
        Some(2) => UrlState::Excluded,
        Some(3) => UrlState::Queued,
        _ => UrlState::Unknown,
    })
}

/// Snapshot of every URL in any state, for filtering a discovery batch in
/// memory instead of one query per link.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_known_urls(pool: &SqlitePool) -> Result<HashSet<String>, DbError> {
    let urls: Vec<String> = sqlx::query_scalar(
        "SELECT url FROM articles \
         UNION SELECT url FROM exclude_articles \
         UNION SELECT url FROM scrape_que",
    )
    .fetch_all(pool)
    .await?;

    Ok(urls.into_iter().collect())
}

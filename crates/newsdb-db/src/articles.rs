//! Database operations for `articles` and `exclude_articles`.
//!
//! Both writes remove the URL from `scrape_que` in the same transaction so a
//! URL never sits in two tables at once.

use chrono::NaiveDate;
use newsdb_core::Article;
use sqlx::SqlitePool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub url: String,
    pub scrape_date: NaiveDate,
    pub content: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            url: row.url,
            scrape_date: row.scrape_date,
            content: row.content,
        }
    }
}

/// A row from the `exclude_articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExcludedRow {
    pub url: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Stores a normalized article and removes its URL from the queue.
///
/// Articles are write-once; storing a URL that already exists is a
/// [`DbError::Duplicate`].
///
/// # Errors
///
/// Returns [`DbError::Duplicate`] or [`DbError::Sqlx`].
pub async fn store_article(pool: &SqlitePool, article: &Article) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO articles (url, scrape_date, content) VALUES (?1, ?2, ?3)")
        .bind(&article.url)
        .bind(article.scrape_date)
        .bind(&article.content)
        .execute(&mut *tx)
        .await
        .map_err(|e| crate::map_unique(e, "article", &article.url))?;

    sqlx::query("DELETE FROM scrape_que WHERE url = ?1")
        .bind(&article.url)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Adds `url` to the exclude list with `reason` and removes it from the queue.
///
/// Re-excluding a URL keeps the original reason.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn exclude_url(pool: &SqlitePool, url: &str, reason: &str) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO exclude_articles (url, reason) VALUES (?1, ?2) \
         ON CONFLICT (url) DO NOTHING",
    )
    .bind(url)
    .bind(reason)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM scrape_que WHERE url = ?1")
        .bind(url)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns all stored articles ordered by scrape date, then URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles(pool: &SqlitePool) -> Result<Vec<Article>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(
        "SELECT url, scrape_date, content FROM articles ORDER BY scrape_date ASC, url ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Article::from).collect())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_articles(pool: &SqlitePool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Returns every stored article URL in lexical order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_article_urls(pool: &SqlitePool) -> Result<Vec<String>, DbError> {
    let urls = sqlx::query_scalar::<_, String>("SELECT url FROM articles ORDER BY url ASC")
        .fetch_all(pool)
        .await?;
    Ok(urls)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_excluded(pool: &SqlitePool) -> Result<Vec<ExcludedRow>, DbError> {
    let rows = sqlx::query_as::<_, ExcludedRow>(
        "SELECT url, reason FROM exclude_articles ORDER BY url ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

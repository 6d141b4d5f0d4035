use newsdb_core::CategorySeed;
use sqlx::SqlitePool;

use crate::DbError;

/// Counts reported by [`seed_categories`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_inserted: usize,
    pub keywords_inserted: usize,
}

/// Insert seed categories and keywords that are not yet present.
///
/// Existing rows are left as they are, so hand edits survive a re-seed and
/// running it twice inserts nothing the second time. All inserts run inside
/// one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_categories(
    pool: &SqlitePool,
    seeds: &[CategorySeed],
) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for seed in seeds {
        let inserted = sqlx::query(
            "INSERT INTO categories (category) VALUES (?1) ON CONFLICT (category) DO NOTHING",
        )
        .bind(&seed.name)
        .execute(&mut *tx)
        .await?;
        summary.categories_inserted += usize::try_from(inserted.rows_affected()).unwrap_or(0);

        let category_id: i64 =
            sqlx::query_scalar("SELECT id FROM categories WHERE category = ?1")
                .bind(&seed.name)
                .fetch_one(&mut *tx)
                .await?;

        for keyword in &seed.keywords {
            let inserted = sqlx::query(
                "INSERT INTO keywords (keyword, category_id) VALUES (?1, ?2) \
                 ON CONFLICT (keyword) DO NOTHING",
            )
            .bind(keyword)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
            summary.keywords_inserted += usize::try_from(inserted.rows_affected()).unwrap_or(0);
        }
    }

    tx.commit().await?;
    Ok(summary)
}

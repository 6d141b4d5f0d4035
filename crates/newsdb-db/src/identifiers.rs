//! Category and keyword editing.
//!
//! Every name passes through [`validate_identifier`] before it reaches SQL,
//! so stored identifiers are always trimmed, lowercased and whitespace
//! collapsed.

use newsdb_core::{validate_identifier, Category};
use sqlx::SqlitePool;

use crate::{map_unique, DbError};

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub category: String,
}

/// A row from the `keywords` table joined with its category name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordRow {
    pub keyword: String,
    pub category_id: i64,
    pub category: String,
}

/// Returns every category with its keywords, both in lexical order.
///
/// Categories without keywords are included with an empty list.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>, DbError> {
    let categories = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, category FROM categories ORDER BY category ASC",
    )
    .fetch_all(pool)
    .await?;

    let keywords = sqlx::query_as::<_, KeywordRow>(
        "SELECT k.keyword, k.category_id, c.category \
         FROM keywords k JOIN categories c ON c.id = k.category_id \
         ORDER BY k.keyword ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories
        .into_iter()
        .map(|row| Category {
            keywords: keywords
                .iter()
                .filter(|k| k.category_id == row.id)
                .map(|k| k.keyword.clone())
                .collect(),
            id: row.id,
            name: row.category,
        })
        .collect())
}

/// Creates a category, returning its id.
///
/// # Errors
///
/// Returns [`DbError::Validation`] for malformed names,
/// [`DbError::Duplicate`] if the category exists, or [`DbError::Sqlx`].
pub async fn add_category(pool: &SqlitePool, name: &str) -> Result<i64, DbError> {
    let name = validate_identifier(name)?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (category) VALUES (?1) RETURNING id",
    )
    .bind(&name)
    .fetch_one(pool)
    .await
    .map_err(|e| map_unique(e, "category", &name))?;

    tracing::info!(category = %name, id, "category added");
    Ok(id)
}

/// Deletes a category and, through the foreign key, all of its keywords.
///
/// # Errors
///
/// Returns [`DbError::Validation`], [`DbError::NotFound`] if no such
/// category exists, or [`DbError::Sqlx`].
pub async fn delete_category(pool: &SqlitePool, name: &str) -> Result<(), DbError> {
    let name = validate_identifier(name)?;

    let result = sqlx::query("DELETE FROM categories WHERE category = ?1")
        .bind(&name)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    tracing::info!(category = %name, "category deleted");
    Ok(())
}

/// Adds `keyword` to an existing category.
///
/// A keyword belongs to exactly one category; adding one that already exists
/// anywhere is a [`DbError::Duplicate`].
///
/// # Errors
///
/// Returns [`DbError::Validation`], [`DbError::NotFound`] if the category
/// does not exist, [`DbError::Duplicate`], or [`DbError::Sqlx`].
pub async fn add_keyword(pool: &SqlitePool, category: &str, keyword: &str) -> Result<(), DbError> {
    let category = validate_identifier(category)?;
    let keyword = validate_identifier(keyword)?;

    let category_id = category_id(pool, &category).await?;

    sqlx::query("INSERT INTO keywords (keyword, category_id) VALUES (?1, ?2)")
        .bind(&keyword)
        .bind(category_id)
        .execute(pool)
        .await
        .map_err(|e| map_unique(e, "keyword", &keyword))?;

    tracing::info!(category = %category, keyword = %keyword, "keyword added");
    Ok(())
}

/// Removes `keyword` from `category`.
///
/// # Errors
///
/// Returns [`DbError::Validation`], [`DbError::NotFound`] if the category
/// does not exist or does not own the keyword, or [`DbError::Sqlx`].
pub async fn delete_keyword(
    pool: &SqlitePool,
    category: &str,
    keyword: &str,
) -> Result<(), DbError> {
    let category = validate_identifier(category)?;
    let keyword = validate_identifier(keyword)?;

    let category_id = category_id(pool, &category).await?;

    let result = sqlx::query("DELETE FROM keywords WHERE keyword = ?1 AND category_id = ?2")
        .bind(&keyword)
        .bind(category_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    tracing::info!(category = %category, keyword = %keyword, "keyword deleted");
    Ok(())
}

async fn category_id(pool: &SqlitePool, name: &str) -> Result<i64, DbError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE category = ?1")
        .bind(name)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

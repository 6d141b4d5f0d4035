//! Category and keyword editing for the CLI.

use clap::Subcommand;
use sqlx::SqlitePool;

/// Sub-commands available under `identifiers`.
#[derive(Debug, Subcommand)]
pub enum IdentifierCommands {
    /// Show every category with its keywords
    List,
    /// Create a new, empty category
    AddCategory {
        /// Category name (letters, hyphens and spaces)
        name: String,
    },
    /// Add a keyword or phrase to an existing category
    AddKeyword {
        category: String,
        keyword: String,
    },
    /// Delete a category together with its keywords
    DeleteCategory { name: String },
    /// Remove a keyword from a category
    DeleteKeyword {
        category: String,
        keyword: String,
    },
}

/// Dispatch an `identifiers` sub-command.
///
/// Rejected input (malformed names, duplicates, unknown categories) is
/// reported on stderr and is not an error; edits are one-off commands.
///
/// # Errors
///
/// Returns an error only if the database fails.
pub(crate) async fn run_identifiers(
    pool: &SqlitePool,
    command: IdentifierCommands,
) -> anyhow::Result<()> {
    let outcome = match &command {
        IdentifierCommands::List => return list_identifiers(pool).await,
        IdentifierCommands::AddCategory { name } => newsdb_db::add_category(pool, name)
            .await
            .map(|_| format!("added category '{}'", name.trim())),
        IdentifierCommands::AddKeyword { category, keyword } => {
            newsdb_db::add_keyword(pool, category, keyword)
                .await
                .map(|()| format!("added '{}' to '{}'", keyword.trim(), category.trim()))
        }
        IdentifierCommands::DeleteCategory { name } => newsdb_db::delete_category(pool, name)
            .await
            .map(|()| format!("deleted category '{}' and its keywords", name.trim())),
        IdentifierCommands::DeleteKeyword { category, keyword } => {
            newsdb_db::delete_keyword(pool, category, keyword)
                .await
                .map(|()| format!("removed '{}' from '{}'", keyword.trim(), category.trim()))
        }
    };

    match outcome {
        Ok(message) => println!("{message}"),
        Err(newsdb_db::DbError::NotFound) => eprintln!("no such {}", missing_target(&command)),
        Err(e) if e.is_user_error() => eprintln!("rejected: {e}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn missing_target(command: &IdentifierCommands) -> &'static str {
    match command {
        IdentifierCommands::DeleteKeyword { .. } => "keyword in that category",
        _ => "category",
    }
}

async fn list_identifiers(pool: &SqlitePool) -> anyhow::Result<()> {
    let categories = newsdb_db::list_categories(pool).await?;
    if categories.is_empty() {
        println!("no categories; run `newsdb db seed` or `identifiers add-category`");
        return Ok(());
    }

    println!("{:<24}KEYWORDS", "CATEGORY");
    for category in &categories {
        let keywords = if category.keywords.is_empty() {
            "-".to_string()
        } else {
            category.keywords.join(", ")
        };
        println!("{:<24}{keywords}", category.name);
    }
    Ok(())
}

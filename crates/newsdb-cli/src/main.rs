mod analyze;
mod crawl;
mod export;
mod identifiers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;

use crate::analyze::AnalyzeCommands;
use crate::identifiers::IdentifierCommands;

#[derive(Debug, Parser)]
#[command(name = "newsdb")]
#[command(about = "News article crawler and keyword analytics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover new article links and scrape the queue
    Crawl {
        /// Listing pages to follow per configured page, including the first
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=15))]
        depth: u32,
        /// Append a summary entry to the run log
        #[arg(long)]
        batch: bool,
        /// Skip the random pause between requests to the same site
        #[arg(long)]
        no_polite: bool,
        /// Walk listing pages even if the queue was filled recently
        #[arg(long)]
        force_discovery: bool,
    },
    /// Keyword and category reports over stored articles
    Analyze {
        #[command(subcommand)]
        command: AnalyzeCommands,
    },
    /// Edit categories and their keywords
    Identifiers {
        #[command(subcommand)]
        command: IdentifierCommands,
    },
    /// Write every stored article URL to a file
    ExportLinks {
        /// Destination file, one URL per line
        #[arg(long, default_value = "article_links.txt")]
        output: PathBuf,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database answers
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Insert seed categories and keywords that are missing
    Seed,
    /// Show recent crawl runs and their counts
    Runs {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("no command given; run `newsdb --help` for usage");
        return Ok(());
    };

    let config = newsdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = newsdb_db::PoolConfig::from_app_config(&config);
    let pool = newsdb_db::connect_pool(&config.database_url, pool_config).await?;

    if let Commands::Db {
        command: DbCommands::Migrate,
    } = command
    {
        let applied = newsdb_db::run_migrations(&pool).await?;
        println!("migrations up to date ({applied} applied)");
        return Ok(());
    }
    newsdb_db::run_migrations(&pool).await?;

    match command {
        Commands::Crawl {
            depth,
            batch,
            no_polite,
            force_discovery,
        } => {
            crawl::run_crawl_command(&pool, &config, depth, batch, !no_polite, force_discovery)
                .await?;
        }
        Commands::Analyze { command } => analyze::run_analyze(&pool, command).await?,
        Commands::Identifiers { command } => identifiers::run_identifiers(&pool, command).await?,
        Commands::ExportLinks { output } => export::run_export_links(&pool, &output).await?,
        Commands::Db { command } => run_db(&pool, &config, command).await?,
    }

    Ok(())
}

async fn run_db(
    pool: &SqlitePool,
    config: &newsdb_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            newsdb_db::ping(pool).await?;
            println!("database ok");
        }
        // Handled before the unconditional migration run in `main`.
        DbCommands::Migrate => {}
        DbCommands::Seed => {
            let file = newsdb_core::load_categories(&config.categories_path)?;
            let summary = newsdb_db::seed_categories(pool, &file.categories).await?;
            println!(
                "seeded {} categories and {} keywords from {}",
                summary.categories_inserted,
                summary.keywords_inserted,
                config.categories_path.display()
            );
        }
        DbCommands::Runs { limit } => list_runs(pool, limit).await?,
    }
    Ok(())
}

async fn list_runs(pool: &SqlitePool, limit: i64) -> anyhow::Result<()> {
    let runs = newsdb_db::list_crawl_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no crawl runs recorded; run `newsdb crawl` first");
        return Ok(());
    }

    println!(
        "{:<6}{:<8}{:<11}{:<18}{:<8}{:<9}ERROR",
        "ID", "TRIGGER", "STATUS", "STARTED", "STORED", "OMITTED"
    );
    for run in &runs {
        let started = run.started_at.map_or_else(
            || "-".to_string(),
            |t| t.format("%Y-%m-%d %H:%M").to_string(),
        );
        println!(
            "{:<6}{:<8}{:<11}{:<18}{:<8}{:<9}{}",
            run.id,
            run.trigger_source,
            run.status,
            started,
            run.articles_stored,
            run.urls_omitted,
            run.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Attempt to mark a crawl run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &SqlitePool, run_id: i64, message: String) {
    if let Err(mark_err) = newsdb_db::fail_crawl_run(pool, run_id, &message).await {
        tracing::error!(run_id, error = %mark_err, "failed to mark crawl run as failed");
    }
}

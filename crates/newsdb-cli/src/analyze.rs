//! Analytics report handlers for the CLI.
//!
//! Every report loads the stored articles and the current categories once,
//! builds a [`Corpus`] over them, and prints either a plain table or JSON.

use clap::{Args, Subcommand};
use newsdb_analytics::{
    CategoryHits, Corpus, CorpusStats, CountryHits, CountryTable, DateCategoryHits,
    DomainCategoryHits, KeywordDateHits, KeywordHits, Matcher,
};
use serde::Serialize;
use sqlx::SqlitePool;

/// Output options shared by every report.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct ReportArgs {
    /// Show at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Sub-commands available under `analyze`.
#[derive(Debug, Subcommand)]
pub enum AnalyzeCommands {
    /// Keywords by total occurrences across all articles
    TopKeywords {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Categories by number of articles classified into them
    TopCategories {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Article categories per scrape date
    CategoriesByDate {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Article categories per news site
    CategoriesByDomain {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Daily occurrences of one keyword, or two side by side
    KeywordsByDate {
        /// Keyword or phrase to count
        first: String,
        /// Optional second keyword to compare against
        second: Option<String>,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Countries mentioned across all articles
    Countries {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Article totals, scrape days and per-site counts
    Stats {
        #[command(flatten)]
        report: ReportArgs,
    },
}

/// Dispatch an `analyze` sub-command.
///
/// # Errors
///
/// Returns an error if a database query fails, a keyword cannot be compiled,
/// or JSON serialization fails.
pub(crate) async fn run_analyze(pool: &SqlitePool, command: AnalyzeCommands) -> anyhow::Result<()> {
    let articles = newsdb_db::list_articles(pool).await?;
    let categories = newsdb_db::list_categories(pool).await?;
    let matcher = Matcher::new(&categories)?;
    let corpus = Corpus::new(&articles, &matcher);

    if corpus.is_empty() {
        println!("no articles stored; run `newsdb crawl` first");
        return Ok(());
    }
    tracing::debug!(
        articles = corpus.len(),
        categories = categories.len(),
        "corpus loaded"
    );

    match command {
        AnalyzeCommands::TopKeywords { report } => {
            emit(&corpus.top_keywords(), report, print_keywords)?;
        }
        AnalyzeCommands::TopCategories { report } => {
            emit(&corpus.top_categories(), report, print_categories)?;
        }
        AnalyzeCommands::CategoriesByDate { report } => {
            emit(&corpus.categories_by_date(), report, print_categories_by_date)?;
        }
        AnalyzeCommands::CategoriesByDomain { report } => {
            emit(&corpus.categories_by_domain(), report, print_categories_by_domain)?;
        }
        AnalyzeCommands::KeywordsByDate {
            first,
            second,
            report,
        } => {
            let rows = corpus.keywords_by_date(&first, second.as_deref())?;
            emit(&rows, report, |rows| {
                print_keywords_by_date(rows, &first, second.as_deref());
            })?;
        }
        AnalyzeCommands::Countries { report } => {
            let table = CountryTable::builtin()?;
            emit(&corpus.country_mentions(&table), report, print_countries)?;
        }
        AnalyzeCommands::Stats { report } => {
            let stats = corpus.stats();
            if report.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats, report.limit);
            }
        }
    }

    Ok(())
}

/// Truncates `rows` to the requested limit and prints them.
fn emit<T, F>(rows: &[T], report: ReportArgs, table: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&[T]),
{
    let shown = &rows[..report.limit.unwrap_or(rows.len()).min(rows.len())];
    if report.json {
        println!("{}", serde_json::to_string_pretty(shown)?);
    } else if shown.is_empty() {
        println!("no matches");
    } else {
        table(shown);
    }
    Ok(())
}

fn print_keywords(rows: &[KeywordHits]) {
    println!("{:<28}{:<20}COUNT", "KEYWORD", "CATEGORY");
    for row in rows {
        println!("{:<28}{:<20}{}", row.keyword, row.category, row.count);
    }
}

fn print_categories(rows: &[CategoryHits]) {
    println!("{:<24}ARTICLES", "CATEGORY");
    for row in rows {
        println!("{:<24}{}", row.category, row.articles);
    }
}

fn print_categories_by_date(rows: &[DateCategoryHits]) {
    println!("{:<12}{:<24}ARTICLES", "DATE", "CATEGORY");
    for row in rows {
        println!(
            "{:<12}{:<24}{}",
            row.date.format("%Y-%m-%d"),
            row.category,
            row.articles
        );
    }
}

fn print_categories_by_domain(rows: &[DomainCategoryHits]) {
    println!("{:<28}{:<24}ARTICLES", "DOMAIN", "CATEGORY");
    for row in rows {
        println!("{:<28}{:<24}{}", row.domain, row.category, row.articles);
    }
}

fn print_keywords_by_date(rows: &[KeywordDateHits], first: &str, second: Option<&str>) {
    match second {
        Some(second) => println!("{:<12}{:<20}{}", "DATE", first.to_uppercase(), second.to_uppercase()),
        None => println!("{:<12}{}", "DATE", first.to_uppercase()),
    }
    for row in rows {
        let date = row.date.format("%Y-%m-%d");
        match row.second {
            Some(count) => println!("{date:<12}{:<20}{count}", row.first),
            None => println!("{date:<12}{}", row.first),
        }
    }
}

fn print_countries(rows: &[CountryHits]) {
    println!("{:<32}{:<6}COUNT", "COUNTRY", "ISO3");
    for row in rows {
        println!("{:<32}{:<6}{}", row.country, row.iso3, row.count);
    }
}

fn print_stats(stats: &CorpusStats, limit: Option<usize>) {
    let fmt_date = |d: Option<chrono::NaiveDate>| {
        d.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
    };
    println!("Articles:    {}", stats.total_articles);
    println!("Scrape days: {}", stats.scrape_days);
    println!("First date:  {}", fmt_date(stats.first_date));
    println!("Last date:   {}", fmt_date(stats.last_date));
    println!();

    let mut domains: Vec<(&String, &usize)> = stats.articles_per_domain.iter().collect();
    domains.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    println!("{:<28}ARTICLES", "DOMAIN");
    for (domain, count) in domains.into_iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{domain:<28}{count}");
    }
}

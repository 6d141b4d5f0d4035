//! Crawl orchestration: discover article links, queue them, then drain the
//! queue one URL at a time.
//!
//! Failures degrade to skipping a unit of work. A site whose discovery fails
//! is skipped for this run; a URL whose fetch fails stays queued; a URL whose
//! page holds no article is excluded for good. Only database errors abort
//! the run.

mod run_log;
mod schedule;

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Local, Utc};
use newsdb_core::{normalize, AppConfig, Article, SiteProfile};
use newsdb_scraper::{discover_urls, extract_text, NewsClient, PoliteDelay, ScraperError};
use sqlx::SqlitePool;

use crate::fail_run_best_effort;

use schedule::{interleave_by_domain, plan_drain, DrainStep};

/// Knobs for one crawl run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CrawlOptions {
    /// Listing pages followed per configured page, including the first.
    pub depth: u32,
    /// Re-walk listing pages even when the queue was filled recently.
    pub force_discovery: bool,
    /// Discovery is skipped while the newest queued URL is younger than this.
    pub freshness: Duration,
}

/// Counts reported at the end of a crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CrawlSummary {
    pub discovery_ran: bool,
    pub sites_failed: usize,
    pub urls_queued: usize,
    pub urls_pruned: u64,
    pub stored: usize,
    pub excluded: usize,
    /// Transport failures and URLs with no configured site; still queued.
    pub deferred: usize,
}

impl CrawlSummary {
    /// URLs attempted this run that did not become articles.
    pub fn omitted(&self) -> usize {
        self.excluded + self.deferred
    }
}

/// What happened to one drained URL.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UrlOutcome {
    Stored,
    Excluded(String),
    Deferred,
}

/// Runs a full crawl against `sites` and returns its counts.
///
/// # Errors
///
/// Returns an error only when a database operation fails.
pub(crate) async fn run_crawl(
    pool: &SqlitePool,
    client: &NewsClient,
    sites: &[SiteProfile],
    options: CrawlOptions,
) -> anyhow::Result<CrawlSummary> {
    let mut summary = CrawlSummary::default();

    if options.force_discovery || discovery_due(pool, options.freshness).await? {
        summary.discovery_ran = true;
        let (queued, failed) = discover_all(pool, client, sites, options.depth).await?;
        summary.urls_queued = queued;
        summary.sites_failed = failed;
    } else {
        tracing::info!("queue was filled recently; skipping listing-page discovery");
    }

    summary.urls_pruned = newsdb_db::prune_resolved_queue(pool).await?;
    if summary.urls_pruned > 0 {
        tracing::info!(pruned = summary.urls_pruned, "removed already-resolved URLs from queue");
    }

    let queue = newsdb_db::list_queue(pool).await?;
    let ordered = interleave_by_domain(queue.into_iter().map(|row| row.url));
    let total = ordered.len();
    tracing::info!(queued = total, "draining scrape queue");

    for (index, step) in plan_drain(ordered, sites).into_iter().enumerate() {
        let (url, site) = match step {
            DrainStep::Unconfigured(url) => {
                tracing::warn!(url = %url, "no site profile for queued URL; leaving it queued");
                summary.deferred += 1;
                continue;
            }
            DrainStep::Fetch { url, site, pause } => {
                if pause {
                    client.polite_pause().await;
                }
                (url, site)
            }
        };

        match process_url(pool, client, site, &url).await? {
            UrlOutcome::Stored => {
                summary.stored += 1;
                tracing::info!(url = %url, progress = %format!("{}/{total}", index + 1), "article stored");
            }
            UrlOutcome::Excluded(reason) => {
                summary.excluded += 1;
                tracing::info!(url = %url, reason = %reason, "URL excluded");
            }
            UrlOutcome::Deferred => summary.deferred += 1,
        }
    }

    tracing::info!(
        stored = summary.stored,
        excluded = summary.excluded,
        deferred = summary.deferred,
        "crawl finished"
    );
    Ok(summary)
}

/// `true` when the queue is empty or its newest entry is older than `freshness`.
async fn discovery_due(pool: &SqlitePool, freshness: Duration) -> anyhow::Result<bool> {
    let Some(newest) = newsdb_db::newest_queue_time(pool).await? else {
        return Ok(true);
    };
    let age = Utc::now().signed_duration_since(newest);
    Ok(age.to_std().is_ok_and(|age| age >= freshness))
}

/// Discovers links on every site and queues the ones not seen before.
///
/// Returns `(newly queued, sites that failed)`.
async fn discover_all(
    pool: &SqlitePool,
    client: &NewsClient,
    sites: &[SiteProfile],
    depth: u32,
) -> anyhow::Result<(usize, usize)> {
    let mut known: HashSet<String> = newsdb_db::load_known_urls(pool).await?;
    let mut queued = 0usize;
    let mut failed = 0usize;

    for site in sites {
        let links = match discover_urls(client, site, depth).await {
            Ok(links) => links,
            Err(e) => {
                tracing::error!(domain = %site.domain, error = %e, "site discovery failed; skipping site");
                failed += 1;
                continue;
            }
        };

        let fresh: Vec<String> = links.into_iter().filter(|url| !known.contains(url)).collect();
        let inserted = newsdb_db::enqueue_urls(pool, &fresh, Utc::now()).await?;
        tracing::info!(domain = %site.domain, new_urls = inserted, "queued discovered links");
        queued += inserted;
        known.extend(fresh);
    }

    Ok((queued, failed))
}

/// Fetches and extracts one queued URL and records the result.
async fn process_url(
    pool: &SqlitePool,
    client: &NewsClient,
    site: &SiteProfile,
    url: &str,
) -> anyhow::Result<UrlOutcome> {
    match newsdb_db::increment_retries(pool, url).await {
        Ok(()) => {}
        Err(newsdb_db::DbError::NotFound) => {
            // Resolved by an overlapping run since the queue snapshot.
            tracing::warn!(url = %url, "URL left the queue before its fetch; skipping");
            return Ok(UrlOutcome::Deferred);
        }
        Err(e) => return Err(e.into()),
    }

    match extract_text(client, url, site).await {
        Ok(text) => {
            let article = Article {
                url: url.to_string(),
                scrape_date: Local::now().date_naive(),
                content: normalize(&text),
            };
            match newsdb_db::store_article(pool, &article).await {
                Ok(()) => Ok(UrlOutcome::Stored),
                Err(newsdb_db::DbError::Duplicate { .. }) => {
                    // Stored by an overlapping run; drop the stale queue row.
                    tracing::warn!(url = %url, "article already stored");
                    newsdb_db::prune_resolved_queue(pool).await?;
                    Ok(UrlOutcome::Deferred)
                }
                Err(e) => Err(e.into()),
            }
        }
        Err(ScraperError::Extraction { reason, .. }) => {
            let reason = reason.to_string();
            newsdb_db::exclude_url(pool, url, &reason).await?;
            Ok(UrlOutcome::Excluded(reason))
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "fetch failed; URL stays queued");
            Ok(UrlOutcome::Deferred)
        }
    }
}

/// Handles `newsdb crawl`: records a crawl run, crawls, and in batch mode
/// appends the summary to the run log.
///
/// # Errors
///
/// Returns an error if the site file is invalid, the HTTP client cannot be
/// built, or a database operation fails.
pub(crate) async fn run_crawl_command(
    pool: &SqlitePool,
    config: &AppConfig,
    depth: u32,
    batch: bool,
    polite: bool,
    force_discovery: bool,
) -> anyhow::Result<()> {
    let sites = newsdb_core::load_sites(&config.sites_path)?;
    let mut client = NewsClient::from_app_config(config)?;
    if !polite {
        client = client.with_polite_delay(PoliteDelay::disabled());
    }

    let options = CrawlOptions {
        depth,
        force_discovery,
        freshness: Duration::from_secs(config.crawl_freshness_secs),
    };

    let trigger = if batch { "batch" } else { "cli" };
    let run = newsdb_db::create_crawl_run(pool, trigger).await?;
    if let Err(e) = newsdb_db::start_crawl_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let summary = match run_crawl(pool, &client, &sites.sites, options).await {
        Ok(summary) => summary,
        Err(e) => {
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            return Err(e);
        }
    };

    let stored = i64::try_from(summary.stored).unwrap_or(i64::MAX);
    let omitted = i64::try_from(summary.omitted()).unwrap_or(i64::MAX);
    if let Err(e) = newsdb_db::complete_crawl_run(pool, run.id, stored, omitted).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    println!(
        "Successfully stored {} new article(s) in the database ({} were omitted).",
        summary.stored,
        summary.omitted()
    );
    if summary.sites_failed > 0 {
        println!("{} site(s) could not be crawled; see log for details", summary.sites_failed);
    }

    if batch {
        run_log::append_entry(
            &config.run_log_path,
            Local::now().naive_local(),
            summary.stored,
            summary.omitted(),
        )?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "crawl_test.rs"]
mod tests;

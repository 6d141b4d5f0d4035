//! Store-level tests against an in-memory SQLite database.

use std::str::FromStr;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use newsdb_core::{Article, CategorySeed, UrlState};
use newsdb_db::{
    add_category, add_keyword, complete_crawl_run, count_articles, create_crawl_run,
    delete_category, delete_keyword, enqueue_url, enqueue_urls, exclude_url, fail_crawl_run,
    get_crawl_run, increment_retries, list_article_urls, list_articles, list_categories,
    list_crawl_runs,
    list_excluded, list_queue, load_known_urls, newest_queue_time, prune_resolved_queue,
    run_migrations, seed_categories, start_crawl_run, store_article, url_state, DbError,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

fn article(url: &str, content: &str) -> Article {
    Article {
        url: url.to_string(),
        scrape_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let pool = memory_pool().await;
    assert_eq!(run_migrations(&pool).await.unwrap(), 0);
    newsdb_db::ping(&pool).await.unwrap();
}

#[tokio::test]
async fn url_lifecycle_moves_between_tables() {
    let pool = memory_pool().await;
    let url = "https://apnews.com/article/one";

    assert_eq!(url_state(&pool, url).await.unwrap(), UrlState::Unknown);

    assert!(enqueue_url(&pool, url, Utc::now()).await.unwrap());
    assert!(!enqueue_url(&pool, url, Utc::now()).await.unwrap());
    assert_eq!(url_state(&pool, url).await.unwrap(), UrlState::Queued);

    increment_retries(&pool, url).await.unwrap();
    increment_retries(&pool, url).await.unwrap();
    let queue = list_queue(&pool).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].scrape_retries, 2);

    store_article(&pool, &article(url, "economy inflation")).await.unwrap();
    assert_eq!(url_state(&pool, url).await.unwrap(), UrlState::Stored);
    assert!(list_queue(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn exclusion_dequeues_and_records_reason() {
    let pool = memory_pool().await;
    let url = "https://vox.com/2024/1/1/stub";

    enqueue_url(&pool, url, Utc::now()).await.unwrap();
    exclude_url(&pool, url, "too few paragraphs: 3").await.unwrap();

    assert_eq!(url_state(&pool, url).await.unwrap(), UrlState::Excluded);
    assert!(list_queue(&pool).await.unwrap().is_empty());
    let excluded = list_excluded(&pool).await.unwrap();
    assert_eq!(excluded[0].reason, "too few paragraphs: 3");
}

#[tokio::test]
async fn increment_retries_on_unqueued_url_is_not_found() {
    let pool = memory_pool().await;
    let err = increment_retries(&pool, "https://nowhere.test/x").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[tokio::test]
async fn storing_an_article_twice_is_a_duplicate() {
    let pool = memory_pool().await;
    let a = article("https://bbc.com/news/world-1", "text");
    store_article(&pool, &a).await.unwrap();
    let err = store_article(&pool, &a).await.unwrap_err();
    assert!(matches!(err, DbError::Duplicate { kind: "article", .. }));
    assert_eq!(count_articles(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn known_urls_span_all_three_tables() {
    let pool = memory_pool().await;
    enqueue_url(&pool, "https://a.test/q", Utc::now()).await.unwrap();
    store_article(&pool, &article("https://a.test/s", "x")).await.unwrap();
    exclude_url(&pool, "https://a.test/e", "container not found").await.unwrap();

    let known = load_known_urls(&pool).await.unwrap();
    assert_eq!(known.len(), 3);
    assert!(known.contains("https://a.test/e"));
}

#[tokio::test]
async fn prune_removes_resolved_rows_left_in_queue() {
    let pool = memory_pool().await;
    // Simulate an overlapping run that stored the URL without dequeuing it.
    store_article(&pool, &article("https://a.test/1", "x")).await.unwrap();
    enqueue_url(&pool, "https://a.test/1", Utc::now()).await.unwrap();
    enqueue_url(&pool, "https://a.test/2", Utc::now()).await.unwrap();

    assert_eq!(prune_resolved_queue(&pool).await.unwrap(), 1);
    let queue = list_queue(&pool).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].url, "https://a.test/2");
    assert_eq!(
        url_state(&pool, "https://a.test/1").await.unwrap(),
        UrlState::Stored
    );
}

#[tokio::test]
async fn newest_queue_time_returns_latest() {
    let pool = memory_pool().await;
    assert!(newest_queue_time(&pool).await.unwrap().is_none());

    let older = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let newer = older + Duration::hours(3);
    enqueue_urls(&pool, ["https://a.test/1"], older).await.unwrap();
    enqueue_urls(&pool, ["https://a.test/2"], newer).await.unwrap();

    assert_eq!(newest_queue_time(&pool).await.unwrap(), Some(newer));
}

#[tokio::test]
async fn articles_and_urls_are_listed_in_order() {
    let pool = memory_pool().await;
    store_article(&pool, &article("https://b.test/2", "b")).await.unwrap();
    store_article(&pool, &article("https://a.test/1", "a")).await.unwrap();

    let urls = list_article_urls(&pool).await.unwrap();
    assert_eq!(urls, vec!["https://a.test/1", "https://b.test/2"]);
    let articles = list_articles(&pool).await.unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].content, "a");
}

#[tokio::test]
async fn identifier_editing_validates_and_cascades() {
    let pool = memory_pool().await;

    add_category(&pool, "  Space  Travel ").await.unwrap();
    add_keyword(&pool, "space travel", "Orbit").await.unwrap();
    add_keyword(&pool, "space travel", "launch pad").await.unwrap();

    let err = add_category(&pool, "space travel").await.unwrap_err();
    assert!(matches!(err, DbError::Duplicate { kind: "category", .. }));
    let err = add_keyword(&pool, "space travel", "orbit").await.unwrap_err();
    assert!(matches!(err, DbError::Duplicate { kind: "keyword", .. }));
    let err = add_keyword(&pool, "missing", "rocket").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
    let err = add_keyword(&pool, "space travel", "r2d2").await.unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    let categories = list_categories(&pool).await.unwrap();
    assert_eq!(categories[0].name, "space travel");
    assert_eq!(categories[0].keywords, vec!["launch pad", "orbit"]);

    delete_keyword(&pool, "space travel", "orbit").await.unwrap();
    assert!(matches!(
        delete_keyword(&pool, "space travel", "orbit").await.unwrap_err(),
        DbError::NotFound
    ));

    delete_category(&pool, "space travel").await.unwrap();
    assert!(list_categories(&pool).await.unwrap().is_empty());
    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM keywords")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}

#[tokio::test]
async fn categories_without_keywords_are_listed() {
    let pool = memory_pool().await;
    add_category(&pool, "empty").await.unwrap();
    let categories = list_categories(&pool).await.unwrap();
    assert_eq!(categories.len(), 1);
    assert!(categories[0].keywords.is_empty());
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let pool = memory_pool().await;
    let seeds = vec![
        CategorySeed {
            name: "business".to_string(),
            keywords: vec!["economy".to_string(), "supply chain".to_string()],
        },
        CategorySeed {
            name: "health".to_string(),
            keywords: vec!["vaccine".to_string()],
        },
    ];

    let first = seed_categories(&pool, &seeds).await.unwrap();
    assert_eq!(first.categories_inserted, 2);
    assert_eq!(first.keywords_inserted, 3);

    let second = seed_categories(&pool, &seeds).await.unwrap();
    assert_eq!(second.categories_inserted, 0);
    assert_eq!(second.keywords_inserted, 0);
}

#[tokio::test]
async fn crawl_run_lifecycle() {
    let pool = memory_pool().await;

    let run = create_crawl_run(&pool, "cli").await.unwrap();
    assert_eq!(run.status, "queued");

    assert!(matches!(
        complete_crawl_run(&pool, run.id, 1, 0).await.unwrap_err(),
        DbError::InvalidCrawlRunTransition { expected_status: "running", .. }
    ));

    start_crawl_run(&pool, run.id).await.unwrap();
    complete_crawl_run(&pool, run.id, 12, 3).await.unwrap();

    let done = get_crawl_run(&pool, run.id).await.unwrap();
    assert_eq!(done.status, "succeeded");
    assert_eq!(done.articles_stored, 12);
    assert_eq!(done.urls_omitted, 3);
    assert!(done.started_at.is_some());
    assert!(done.completed_at.is_some());

    let failed = create_crawl_run(&pool, "batch").await.unwrap();
    start_crawl_run(&pool, failed.id).await.unwrap();
    fail_crawl_run(&pool, failed.id, "sites file missing").await.unwrap();
    let failed = get_crawl_run(&pool, failed.id).await.unwrap();
    assert_eq!(failed.status, "failed");
    assert_eq!(failed.error_message.as_deref(), Some("sites file missing"));

    let runs = list_crawl_runs(&pool, 10).await.unwrap();
    let ids: Vec<i64> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![failed.id, run.id], "newest run first");
    assert_eq!(list_crawl_runs(&pool, 1).await.unwrap().len(), 1);
}

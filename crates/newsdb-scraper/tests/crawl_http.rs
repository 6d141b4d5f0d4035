//! HTTP-level tests for discovery, extraction and fetch retries.
//!
//! Each test stands up a local `wiremock` server; listing URLs are built with
//! an `http://` prefix and the server's `host:port` as the site domain.

use newsdb_core::SiteProfile;
use newsdb_scraper::{discover_urls, extract_text, NewsClient, PoliteDelay, ScraperError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(max_retries: u32) -> NewsClient {
    NewsClient::new(5, "newsdb-test/0.1", max_retries, 0)
        .expect("failed to build test NewsClient")
        .with_polite_delay(PoliteDelay::disabled())
        .with_url_start("http://")
}

fn domain(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

fn site(server: &MockServer, pages: &[&str], pagin_filter: &str) -> SiteProfile {
    SiteProfile {
        domain: domain(server),
        pages: pages.iter().map(|p| (*p).to_string()).collect(),
        url_filter: "/article/".to_string(),
        url_exclusion: vec!["/article/videos-".to_string()],
        div_filter: "story-body".to_string(),
        p_attr_exclusion: vec!["promo".to_string()],
        pagin_filter: pagin_filter.to_string(),
    }
}

fn html(body: &str) -> String {
    format!("<html><body>{body}</body></html>")
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn discovery_returns_only_matching_links_in_absolute_form() {
    let server = MockServer::start().await;
    let host = domain(&server);

    let listing = html(&format!(
        r#"<a href="/article/one?utm_source=home">One</a>
           <a href="http://{host}/article/two">Two</a>
           <a href="/article/three">Three</a>
           <a href="/article/three">Three again</a>
           <a href="/about">About</a>
           <a href="https://twitter.com/share">Share</a>"#
    ));
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;

    let links = discover_urls(&test_client(0), &site(&server, &["/"], ""), 1)
        .await
        .unwrap();

    let expected: Vec<String> = ["one", "three", "two"]
        .iter()
        .map(|slug| format!("http://{host}/article/{slug}"))
        .collect();
    assert_eq!(links.into_iter().collect::<Vec<_>>(), expected);
}

#[tokio::test]
async fn discovery_drops_excluded_and_foreign_links() {
    let server = MockServer::start().await;

    let listing = html(
        r#"<a href="/article/videos-flood">Video</a>
           <a href="http://127.0.0.1:1/article/elsewhere">Elsewhere</a>
           <a href="/article/kept">Kept</a>"#,
    );
    Mock::given(method("GET"))
        .and(path("/world"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;

    let links = discover_urls(&test_client(0), &site(&server, &["/world"], ""), 1)
        .await
        .unwrap();

    assert_eq!(links.len(), 1);
    assert!(links.iter().next().unwrap().ends_with("/article/kept"));
}

#[tokio::test]
async fn discovery_follows_pagination_until_no_next_link() {
    let server = MockServer::start().await;

    let first = html(
        r#"<a href="/article/p1">P1</a>
           <a class="pager-next" rel="next" href="/news?page=2">Next</a>"#,
    );
    let second = html(r#"<a href="/article/p2">P2</a>"#);

    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(second))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_string(first))
        .expect(1)
        .mount(&server)
        .await;

    let links = discover_urls(&test_client(0), &site(&server, &["/news"], "pager-next"), 5)
        .await
        .unwrap();

    assert_eq!(links.len(), 2);
}

#[tokio::test]
async fn discovery_failure_names_the_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = discover_urls(&test_client(1), &site(&server, &["/"], ""), 1)
        .await
        .unwrap_err();

    match err {
        ScraperError::Discovery { domain: d, source } => {
            assert_eq!(d, domain(&server));
            assert!(matches!(*source, ScraperError::FetchExhausted { attempts: 2, .. }));
        }
        other => panic!("expected Discovery, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn article_page(paragraphs: usize) -> String {
    let body: String = (1..=paragraphs)
        .map(|i| format!("<p>Sentence number {i}.</p>"))
        .collect();
    html(&format!(
        r#"<div class="story-body">{body}<p class="promo-box">Sign up</p></div>"#
    ))
}

#[tokio::test]
async fn extraction_succeeds_with_seven_paragraphs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article/full"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page(7)))
        .mount(&server)
        .await;

    let url = format!("{}/article/full", server.uri());
    let text = extract_text(&test_client(0), &url, &site(&server, &["/"], ""))
        .await
        .unwrap();

    assert!(text.starts_with("Sentence number 1."));
    assert!(text.ends_with("Sentence number 7."));
    assert!(!text.contains("Sign up"));
}

#[tokio::test]
async fn extraction_fails_with_five_paragraphs() {
    let server = MockServer::start().await;
    // The promo paragraph counts toward the threshold before filtering.
    Mock::given(method("GET"))
        .and(path("/article/stub"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page(4)))
        .mount(&server)
        .await;

    let url = format!("{}/article/stub", server.uri());
    let err = extract_text(&test_client(0), &url, &site(&server, &["/"], ""))
        .await
        .unwrap_err();

    assert!(err.is_extraction());
    assert!(err.to_string().ends_with("too few paragraphs: 5"));
}

#[tokio::test]
async fn extraction_transport_failure_is_not_an_extraction_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/article/gone", server.uri());
    let err = extract_text(&test_client(0), &url, &site(&server, &["/"], ""))
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(!err.is_extraction());
}

// ---------------------------------------------------------------------------
// Retries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let body = test_client(3)
        .fetch_html(&format!("{}/flaky", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn fetch_sends_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(wiremock::matchers::header("user-agent", "newsdb-test/0.1"))
        .and(wiremock::matchers::header("sec-fetch-dest", "document"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let body = test_client(0)
        .fetch_html(&format!("{}/headers", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

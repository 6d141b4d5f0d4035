//! HTTP client for news listing and article pages.

use std::time::Duration;

use newsdb_core::{browser_headers, AppConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::error::ScraperError;
use crate::rate_limit::{retry_with_backoff, PoliteDelay};

/// Prefix joined with a site's bare domain to form listing-page URLs.
pub const DEFAULT_URL_START: &str = "https://www.";

/// Fetches pages with browser-like headers, bounded retries and politeness
/// pauses. Requests are issued one at a time by the caller.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    backoff_base_secs: u64,
    url_start: String,
    polite: PoliteDelay,
}

impl NewsClient {
    /// Creates a client with the given timeout, `User-Agent` and retry policy.
    ///
    /// Politeness pauses default to 1 to 3 seconds and listing URLs to
    /// [`DEFAULT_URL_START`].
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidHeader`] if a header value is not valid
    /// ASCII, or [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .default_headers(default_headers(user_agent)?)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
            url_start: DEFAULT_URL_START.to_string(),
            polite: PoliteDelay::default(),
        })
    }

    /// Builds a client from the scraper settings in [`AppConfig`].
    ///
    /// # Errors
    ///
    /// See [`NewsClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Ok(Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.scraper_max_retries,
            config.scraper_retry_backoff_base_secs,
        )?
        .with_polite_delay(PoliteDelay::new(
            config.scraper_polite_delay_min_ms,
            config.scraper_polite_delay_max_ms,
        )))
    }

    #[must_use]
    pub fn with_polite_delay(mut self, polite: PoliteDelay) -> Self {
        self.polite = polite;
        self
    }

    /// Overrides the listing URL prefix, e.g. `http://` for a local server.
    #[must_use]
    pub fn with_url_start(mut self, url_start: &str) -> Self {
        self.url_start = url_start.to_string();
        self
    }

    #[must_use]
    pub fn url_start(&self) -> &str {
        &self.url_start
    }

    /// Scheme used when turning relative links into absolute ones.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url_start
            .split_once("://")
            .map_or("https", |(scheme, _)| scheme)
    }

    #[must_use]
    pub fn polite_delay(&self) -> PoliteDelay {
        self.polite
    }

    /// Sleeps for a random politeness interval.
    pub async fn polite_pause(&self) {
        self.polite.pause().await;
    }

    /// GETs `url` and returns the body of a `200 OK` response.
    ///
    /// Every other status and every transport failure is retried per
    /// [`retry_with_backoff`](crate::rate_limit).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::FetchExhausted`] once all retries fail.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(url, self.max_retries, self.backoff_base_secs, |attempt_url| async move {
            tracing::debug!(url = %attempt_url, "GET");
            let response = self.client.get(&attempt_url).send().await?;
            let status = response.status();
            if status != StatusCode::OK {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: attempt_url,
                });
            }
            Ok(response.text().await?)
        })
        .await
    }
}

/// Browser header set as reqwest defaults. `Accept-Encoding` is left to
/// reqwest, which advertises the gzip and deflate codecs it can decode.
fn default_headers(user_agent: &str) -> Result<HeaderMap, ScraperError> {
    let mut headers = HeaderMap::new();
    for (name, value) in browser_headers(user_agent) {
        if name.eq_ignore_ascii_case("accept-encoding") {
            continue;
        }
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ScraperError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(&value).map_err(|e| ScraperError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

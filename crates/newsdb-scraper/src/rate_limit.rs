//! Retry and politeness timing for crawl requests.
//!
//! Every failed fetch is retried with exponential backoff. Before the first
//! retry only, a URL whose host lacks a `www.` prefix is rewritten to carry
//! one and retried at once, since many news sites only answer on the `www.`
//! host.

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use rand::Rng;
use reqwest::Url;

use crate::error::ScraperError;

/// Returns `true` if `err` is a fetch failure worth another attempt.
///
/// Only transport errors and non-200 statuses are retried. Anything else
/// (bad URL, bad header) would fail the same way again.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::Http(_) | ScraperError::UnexpectedStatus { .. }
    )
}

/// Adds `www.` to a named host that lacks it. IP hosts and `localhost` are
/// left alone.
pub(crate) fn with_www(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();
    let is_ip = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok();
    if is_ip || host.starts_with("www.") || host == "localhost" {
        return None;
    }
    parsed.set_host(Some(&format!("www.{host}"))).ok()?;
    Some(parsed.to_string())
}

/// Runs `operation` against `url`, retrying failures up to `max_retries` times.
///
/// The operation receives the URL to request; it changes only when the
/// `www.` rewrite applies.
///
/// # Backoff schedule
///
/// | Retry | Before the attempt |
/// |-------|--------------------|
/// | 1 | `www.` rewrite with no sleep, or `base * 1` s if the host already has it |
/// | 2 | `base * 2` s |
/// | 3 | `base * 4` s |
///
/// With `max_retries = 3` the operation runs at most 4 times. Each failed
/// attempt is logged at `warn`; exhaustion is logged at `error` and returned
/// as [`ScraperError::FetchExhausted`].
///
/// # Errors
///
/// Returns [`ScraperError::FetchExhausted`] after the last retry fails, or the
/// operation's error unchanged if it is not retriable.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    url: &str,
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut current = url.to_string();
    let mut attempt = 0u32;

    loop {
        let err = match operation(current.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) => return Err(err),
            Err(err) => err,
        };

        tracing::warn!(
            url = %current,
            attempt,
            max_retries,
            error = %err,
            "fetch attempt failed"
        );

        if attempt >= max_retries {
            tracing::error!(url = %url, attempts = attempt + 1, error = %err, "fetch retries exhausted");
            return Err(ScraperError::FetchExhausted {
                url: url.to_string(),
                attempts: attempt + 1,
                last_error: err.to_string(),
            });
        }
        attempt += 1;

        if attempt == 1 {
            if let Some(rewritten) = with_www(&current) {
                tracing::warn!(url = %rewritten, "retrying with www. host");
                current = rewritten;
                continue;
            }
        }

        // base * 2^(retry - 1), saturating on extreme configs.
        let delay_secs = backoff_base_secs.saturating_mul(1u64 << (attempt - 1).min(62));
        tracing::warn!(url = %current, attempt, delay_secs, "backing off before retry");
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
    }
}

/// Randomized pause between requests to the same host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoliteDelay {
    min_ms: u64,
    max_ms: u64,
}

impl PoliteDelay {
    /// `min_ms` and `max_ms` are swapped if given in the wrong order.
    #[must_use]
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.max_ms == 0
    }

    /// Draws one delay uniformly from `[min_ms, max_ms]`.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }

    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }
        let delay = self.sample();
        tracing::debug!(delay_ms = delay.as_millis(), "polite pause");
        tokio::time::sleep(delay).await;
    }
}

impl Default for PoliteDelay {
    fn default() -> Self {
        Self::new(1000, 3000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn status(status: u16, url: &str) -> ScraperError {
        ScraperError::UnexpectedStatus {
            status,
            url: url.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_base_then_double_before_succeeding() {
        let start = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        let result = retry_with_backoff("https://www.example.com/a", 3, 5, |url| {
            let log = Arc::clone(&log);
            async move {
                let mut calls = log.lock().unwrap();
                calls.push(start.elapsed());
                if calls.len() < 3 {
                    Err(status(503, &url))
                } else {
                    Ok("body")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "body");
        let calls = seen.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                Duration::ZERO,
                Duration::from_secs(5),
                Duration::from_secs(15),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_retry_adds_www_without_sleeping() {
        let start = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        let result = retry_with_backoff("https://example.com/a", 3, 5, |url| {
            let log = Arc::clone(&log);
            async move {
                let mut calls = log.lock().unwrap();
                calls.push((url.clone(), start.elapsed()));
                if calls.len() < 3 {
                    Err(status(403, &url))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        let calls = seen.lock().unwrap();
        assert_eq!(calls[0], ("https://example.com/a".to_string(), Duration::ZERO));
        assert_eq!(calls[1], ("https://www.example.com/a".to_string(), Duration::ZERO));
        assert_eq!(
            calls[2],
            ("https://www.example.com/a".to_string(), Duration::from_secs(10))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_attempts_and_last_error() {
        let result = retry_with_backoff("https://www.example.com/a", 2, 1, |url| async move {
            Err::<(), _>(status(500, &url))
        })
        .await;

        match result {
            Err(ScraperError::FetchExhausted {
                url,
                attempts,
                last_error,
            }) => {
                assert_eq!(url, "https://www.example.com/a");
                assert_eq!(attempts, 3);
                assert!(last_error.contains("500"));
            }
            other => panic!("expected FetchExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_retriable_error_is_returned_immediately() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        let result = retry_with_backoff("https://www.example.com/a", 3, 0, |url| {
            let counter = Arc::clone(&counter);
            async move {
                *counter.lock().unwrap() += 1;
                Err::<(), _>(ScraperError::InvalidUrl {
                    url,
                    reason: "bad".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ScraperError::InvalidUrl { .. })));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let result =
            retry_with_backoff("https://example.com", 0, 0, |url| async move {
                Err::<(), _>(status(404, &url))
            })
            .await;
        assert!(matches!(
            result,
            Err(ScraperError::FetchExhausted { attempts: 1, .. })
        ));
    }

    #[test]
    fn www_rewrite_rules() {
        assert_eq!(
            with_www("https://apnews.com/article/x?y=1").as_deref(),
            Some("https://www.apnews.com/article/x?y=1")
        );
        assert_eq!(with_www("https://www.bbc.com/news"), None);
        assert_eq!(with_www("http://127.0.0.1:8080/a"), None);
        assert_eq!(with_www("http://localhost/a"), None);
        assert_eq!(with_www("not a url"), None);
    }

    #[test]
    fn polite_delay_samples_within_bounds() {
        let delay = PoliteDelay::new(1000, 3000);
        for _ in 0..50 {
            let d = delay.sample();
            assert!(d >= Duration::from_millis(1000) && d <= Duration::from_millis(3000));
        }
        assert_eq!(PoliteDelay::new(3000, 1000), delay);
        assert!(PoliteDelay::disabled().is_disabled());
    }
}

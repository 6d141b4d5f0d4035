use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A stored article. The date is the ingestion day, not the publish date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub scrape_date: NaiveDate,
    pub content: String,
}

impl Article {
    /// Host of the article URL without `www.`; see [`domain_of`].
    #[must_use]
    pub fn domain(&self) -> String {
        domain_of(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub keywords: Vec<String>,
}

/// Where a URL sits in the crawl lifecycle.
///
/// A URL is in at most one of the queue, the article store and the exclude
/// list. `Stored` and `Excluded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlState {
    Unknown,
    Queued,
    Stored,
    Excluded,
}

impl UrlState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stored | Self::Excluded)
    }
}

impl std::fmt::Display for UrlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Queued => "queued",
            Self::Stored => "stored",
            Self::Excluded => "excluded",
        };
        f.write_str(s)
    }
}

/// Extracts the host from an absolute URL, lowercased and without a leading
/// `www.`. A port, if present, is kept. Unparseable input yields the input
/// unchanged up to its first `/`.
#[must_use]
pub fn domain_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

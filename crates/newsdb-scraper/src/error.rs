use thiserror::Error;

use crate::extract::ExtractionFailure;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("fetch of {url} failed after {attempts} attempts: {last_error}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("extraction failed for {url}: {reason}")]
    Extraction {
        url: String,
        reason: ExtractionFailure,
    },

    #[error("discovery failed for {domain}: {source}")]
    Discovery {
        domain: String,
        #[source]
        source: Box<ScraperError>,
    },

    #[error("invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid request header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl ScraperError {
    /// Connection, timeout or status failures. The URL stays queued for a
    /// later run.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(_) | Self::UnexpectedStatus { .. } | Self::FetchExhausted { .. } => true,
            Self::Discovery { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// The page was fetched but holds no usable article body. The URL is
    /// excluded permanently.
    #[must_use]
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }
}

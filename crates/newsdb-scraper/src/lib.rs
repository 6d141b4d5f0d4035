pub mod client;
pub mod discover;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod rate_limit;
pub mod urls;

pub use client::{NewsClient, DEFAULT_URL_START};
pub use discover::{discover_urls, parse_listing, LinkPatterns, ListingPage};
pub use error::ScraperError;
pub use extract::{extract_from_html, extract_text, ExtractionFailure, MIN_PARAGRAPHS};
pub use pagination::{find_next_href, pagination_suffix, PaginationStrategy};
pub use rate_limit::PoliteDelay;
pub use urls::{canonicalize_link, listing_page};

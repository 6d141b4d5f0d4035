//! Keyword classification and corpus analytics for `newsdb`.
//!
//! Articles are classified by keyword and phrase hits per category. Bulk
//! reports share one word-frequency table per corpus so single-token lookups
//! stay constant time per keyword.

pub mod corpus;
pub mod countries;
pub mod error;
pub mod frequency;
pub mod matcher;

pub use corpus::{
    CategoryHits, Corpus, CorpusStats, DateCategoryHits, DomainCategoryHits, KeywordDateHits,
    KeywordHits, UNCATEGORIZED,
};
pub use countries::{CountryHits, CountryTable};
pub use error::AnalyticsError;
pub use frequency::WordFrequency;
pub use matcher::{count_occurrences, Matcher, Pattern};

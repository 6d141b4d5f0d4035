//! Keyword patterns and per-article category classification.
//!
//! Single-token keywords are looked up in a [`WordFrequency`] table; phrases
//! are counted with a word-bounded regex. Keywords go through
//! [`newsdb_core::normalize`] first so they compare against stored article
//! text on equal terms.

use newsdb_core::{normalize, Category};
use regex::Regex;

use crate::error::AnalyticsError;
use crate::frequency::WordFrequency;

/// A normalized keyword, matched either as one token or as a phrase.
#[derive(Debug, Clone)]
pub enum Pattern {
    Token(String),
    Phrase { text: String, regex: Regex },
}

impl Pattern {
    /// Normalizes `keyword` and picks the matching strategy. Returns
    /// `Ok(None)` when nothing survives normalization (a bare stopword, a
    /// number).
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidPattern`] if the phrase regex cannot
    /// be built.
    pub fn new(keyword: &str) -> Result<Option<Self>, AnalyticsError> {
        let normalized = normalize(keyword);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        match tokens.as_slice() {
            [] => Ok(None),
            [token] => Ok(Some(Self::Token((*token).to_string()))),
            _ => {
                let body = tokens
                    .iter()
                    .map(|t| regex::escape(t))
                    .collect::<Vec<_>>()
                    .join(r"\s+");
                let source = format!(r"\b{body}\b");
                let regex = Regex::new(&source).map_err(|source| {
                    AnalyticsError::InvalidPattern {
                        pattern: keyword.to_string(),
                        source,
                    }
                })?;
                Ok(Some(Self::Phrase {
                    text: normalized.clone(),
                    regex,
                }))
            }
        }
    }

    /// The normalized keyword text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Token(token) => token,
            Self::Phrase { text, .. } => text,
        }
    }

    #[must_use]
    pub fn is_phrase(&self) -> bool {
        matches!(self, Self::Phrase { .. })
    }

    /// Occurrences in `text`. Tokens are read from `words`, which must have
    /// been built from `text` (or from a corpus containing it, for totals).
    #[must_use]
    pub fn count_with(&self, text: &str, words: &WordFrequency<'_>) -> usize {
        match self {
            Self::Token(token) => words.count(token),
            Self::Phrase { regex, .. } => regex.find_iter(text).count(),
        }
    }

    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        match self {
            Self::Token(token) => text.split_whitespace().filter(|t| t == token).count(),
            Self::Phrase { regex, .. } => regex.find_iter(text).count(),
        }
    }
}

/// Counts `keyword` in `text`: word-bounded phrase matches when the keyword
/// has several tokens, exact token matches otherwise.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidPattern`] if the phrase regex cannot be
/// built.
pub fn count_occurrences(text: &str, keyword: &str) -> Result<usize, AnalyticsError> {
    Ok(Pattern::new(keyword)?.map_or(0, |pattern| pattern.count(text)))
}

#[derive(Debug, Clone)]
pub struct KeywordPattern {
    /// Keyword as stored.
    pub keyword: String,
    pub pattern: Pattern,
}

#[derive(Debug, Clone)]
pub struct CategoryPatterns {
    pub name: String,
    pub keywords: Vec<KeywordPattern>,
}

/// Compiled keyword patterns for every category, in lexical category order.
///
/// Classification walks categories in that order and only replaces the
/// leader on a strictly greater score, so ties go to the lexically first
/// category.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    categories: Vec<CategoryPatterns>,
}

impl Matcher {
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidPattern`] for the first keyword whose
    /// phrase regex cannot be built.
    pub fn new(categories: &[Category]) -> Result<Self, AnalyticsError> {
        let mut compiled = Vec::with_capacity(categories.len());
        for category in categories {
            let mut keywords = Vec::with_capacity(category.keywords.len());
            for keyword in &category.keywords {
                match Pattern::new(keyword)? {
                    Some(pattern) => keywords.push(KeywordPattern {
                        keyword: keyword.clone(),
                        pattern,
                    }),
                    None => tracing::debug!(
                        category = %category.name,
                        keyword = %keyword,
                        "keyword is empty after normalization; skipped"
                    ),
                }
            }
            compiled.push(CategoryPatterns {
                name: category.name.clone(),
                keywords,
            });
        }
        compiled.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            categories: compiled,
        })
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryPatterns] {
        &self.categories
    }

    /// Every keyword with its category name.
    pub fn keywords(&self) -> impl Iterator<Item = (&str, &KeywordPattern)> {
        self.categories
            .iter()
            .flat_map(|c| c.keywords.iter().map(move |k| (c.name.as_str(), k)))
    }

    /// Hit totals per category for `text`, in category order.
    #[must_use]
    pub fn scores<'m>(&'m self, text: &str, words: &WordFrequency<'_>) -> Vec<(&'m str, usize)> {
        self.categories
            .iter()
            .map(|category| {
                let hits = category
                    .keywords
                    .iter()
                    .map(|k| k.pattern.count_with(text, words))
                    .sum();
                (category.name.as_str(), hits)
            })
            .collect()
    }

    /// The category with the strictly highest hit total, or `None` when no
    /// keyword matches at all.
    #[must_use]
    pub fn classify(&self, text: &str) -> Option<&str> {
        let words = WordFrequency::of(text);
        let mut best: Option<(&str, usize)> = None;
        for (name, hits) in self.scores(text, &words) {
            if hits > best.map_or(0, |(_, h)| h) {
                best = Some((name, hits));
            }
        }
        best.map(|(name, _)| name)
    }
}

//! Whitespace-token frequency tables.

use std::collections::HashMap;

/// Counts of whitespace-separated tokens, borrowed from the scanned text.
///
/// Built once per article or once per corpus, then queried per keyword.
#[derive(Debug, Clone, Default)]
pub struct WordFrequency<'a> {
    counts: HashMap<&'a str, usize>,
    total: usize,
}

impl<'a> WordFrequency<'a> {
    #[must_use]
    pub fn of(text: &'a str) -> Self {
        let mut table = Self::default();
        table.add(text);
        table
    }

    pub fn from_texts<I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut table = Self::default();
        for text in texts {
            table.add(text);
        }
        table
    }

    pub fn add(&mut self, text: &'a str) {
        for token in text.split_whitespace() {
            *self.counts.entry(token).or_insert(0) += 1;
            self.total += 1;
        }
    }

    /// Exact-token count; `tax` does not match `taxation`.
    #[must_use]
    pub fn count(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_tokens(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn distinct_tokens(&self) -> usize {
        self.counts.len()
    }
}

//! Canonical article text: the form stored in the database and scanned by
//! every analytics query.

use crate::stopwords::is_stopword;

/// Characters removed before tokenizing. Apostrophes, hyphens and `@` are
/// kept so contractions, compounds and emails survive until later stages.
const STRIPPED: &[char] = &[
    '!', '"', '#', '$', '%', '&', '(', ')', '*', '+', ',', '.', '/', ':', ';', '<', '=', '>', '?',
    '[', '\\', ']', '^', '_', '`', '{', '|', '}', '~', '—', '“', '”',
];

const APOSTROPHES: [char; 2] = ['’', '\''];

/// Normalizes raw article text into a space-joined token stream.
///
/// Stages, in order: strip punctuation, lowercase and split on whitespace,
/// drop link tokens, truncate at the first apostrophe, keep alphabetic or
/// hyphenated-compound tokens, drop stopwords and one-letter tokens.
///
/// Applying it to its own output returns the output unchanged.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !STRIPPED.contains(c)).collect();
    let lowered = stripped.to_lowercase();

    lowered
        .split_whitespace()
        .filter(|token| !token.contains("http"))
        .map(|token| match token.find(APOSTROPHES) {
            Some(idx) => &token[..idx],
            None => token,
        })
        .filter(|token| is_alphabetic(token) || is_compound(token))
        .filter(|token| token.chars().count() > 1 && !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `true` for a hyphenated compound such as `stand-up` or `a-b-c`.
///
/// Hyphens must be strictly interior and every hyphen-separated segment must
/// be non-empty and purely alphabetic.
#[must_use]
pub fn is_compound(word: &str) -> bool {
    if !word.contains('-') || word.starts_with('-') || word.ends_with('-') {
        return false;
    }
    word.split('-').all(is_alphabetic)
}

fn is_alphabetic(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}

#[cfg(test)]
#[path = "text_test.rs"]
mod tests;

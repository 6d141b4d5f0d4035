//! "Next page" detection on listing pages.
//!
//! Sites mark up pagination in different ways, so detection is an ordered
//! list of strategies. The first one that yields a link wins; when none do,
//! pagination for that listing page stops.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| css("a[href]"));
static WITH_CLASS: LazyLock<Selector> = LazyLock::new(|| css("[class]"));

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector is valid")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// An anchor whose class matches the filter pattern and whose attribute
    /// values mention "next" or "more". The first such anchor in document
    /// order wins, so a later "more" link cannot override an earlier "next".
    ClassNextOrMore,
    /// An anchor whose `aria-label` equals the filter.
    AriaLabel,
    /// Any element whose class equals the filter and which carries an
    /// attribute value containing a query string.
    ClassQueryAttribute,
}

pub const STRATEGIES: [PaginationStrategy; 3] = [
    PaginationStrategy::ClassNextOrMore,
    PaginationStrategy::AriaLabel,
    PaginationStrategy::ClassQueryAttribute,
];

impl PaginationStrategy {
    #[must_use]
    pub fn find(self, document: &Html, filter: &str) -> Option<String> {
        match self {
            Self::ClassNextOrMore => {
                let pattern = Regex::new(filter).ok()?;
                document
                    .select(&ANCHOR)
                    .filter(|a| class_matches(a, |class| pattern.is_match(class)))
                    .find(|a| {
                        attribute_values(a).any(|v| v.contains("next") || v.contains("more"))
                    })
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string)
            }
            Self::AriaLabel => document
                .select(&ANCHOR)
                .find(|a| a.value().attr("aria-label") == Some(filter))
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string),
            Self::ClassQueryAttribute => document
                .select(&WITH_CLASS)
                .find(|el| class_matches(el, |class| class == filter))
                .and_then(|el| {
                    el.value()
                        .attrs()
                        .map(|(_, value)| value)
                        .find(|value| value.contains('?'))
                })
                .map(str::to_string),
        }
    }
}

/// Runs [`STRATEGIES`] in order and returns the first link found.
#[must_use]
pub fn find_next_href(document: &Html, filter: &str) -> Option<String> {
    if filter.is_empty() {
        return None;
    }
    STRATEGIES.iter().find_map(|strategy| {
        let href = strategy.find(document, filter)?;
        tracing::debug!(?strategy, href = %href, "pagination link found");
        Some(href)
    })
}

/// Reduces a pagination href to a suffix appendable to `listing`
/// (`domain[/path]`).
///
/// Everything before the last `?` is dropped, then everything up to and
/// including `listing`, then every occurrence of the listing page's last
/// path segment.
#[must_use]
pub fn pagination_suffix(href: &str, listing: &str) -> String {
    let mut suffix = match href.rfind('?') {
        Some(idx) => href[idx..].to_string(),
        None => href.to_string(),
    };
    if let Some(idx) = suffix.rfind(listing) {
        suffix = suffix[idx + listing.len()..].to_string();
    }
    let relative_root = match listing.rfind('/') {
        Some(idx) => &listing[idx..],
        None => listing,
    };
    suffix.replace(relative_root, "")
}

/// True if the whole `class` attribute or any single class satisfies `pred`.
fn class_matches(element: &ElementRef<'_>, pred: impl Fn(&str) -> bool) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| pred(class) || class.split_whitespace().any(&pred))
}

/// Attribute values with `class` split into individual names.
pub(crate) fn attribute_values<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element.value().attrs().flat_map(|(name, value)| {
        let parts: Vec<&str> = if name == "class" {
            value.split_whitespace().collect()
        } else {
            vec![value]
        };
        parts
    })
}

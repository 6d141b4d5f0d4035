//! Article body extraction.
//!
//! The body container is found by a per-site pattern, paragraphs are
//! collected inside it, and captions, flagged blocks and site-specific
//! boilerplate are dropped before the text is joined.

use std::fmt;
use std::sync::LazyLock;

use newsdb_core::SiteProfile;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::client::NewsClient;
use crate::error::ScraperError;
use crate::pagination::attribute_values;

/// Fewer paragraphs than this marks a stub or teaser, not an article.
pub const MIN_PARAGRAPHS: usize = 7;

static DIV_WITH_CLASS: LazyLock<Selector> = LazyLock::new(|| css("div[class]"));
static ARTICLE_WITH_CLASS: LazyLock<Selector> = LazyLock::new(|| css("article[class]"));
static DIV_WITH_ID: LazyLock<Selector> = LazyLock::new(|| css("div[id]"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| css("p"));
static WITH_CLASS: LazyLock<Selector> = LazyLock::new(|| css("[class]"));

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector is valid")
}

/// Why a fetched page yielded no article text. Permanent for the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    ContainerNotFound,
    EmptyContainer,
    TooFewParagraphs(usize),
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerNotFound => f.write_str("container not found"),
            Self::EmptyContainer => f.write_str("container is empty"),
            Self::TooFewParagraphs(n) => write!(f, "too few paragraphs: {n}"),
        }
    }
}

/// Fetches `url` and extracts its body text using `site`'s container pattern
/// and paragraph markers.
///
/// # Errors
///
/// Transport failures come back as [`ScraperError::FetchExhausted`];
/// content failures as [`ScraperError::Extraction`]. An invalid container
/// pattern is [`ScraperError::InvalidPattern`].
pub async fn extract_text(
    client: &NewsClient,
    url: &str,
    site: &SiteProfile,
) -> Result<String, ScraperError> {
    let container = Regex::new(&site.div_filter).map_err(|source| ScraperError::InvalidPattern {
        pattern: site.div_filter.clone(),
        source,
    })?;

    let html = client.fetch_html(url).await?;
    extract_from_html(&html, &container, &site.p_attr_exclusion).map_err(|reason| {
        tracing::info!(url, reason = %reason, "article extraction failed");
        ScraperError::Extraction {
            url: url.to_string(),
            reason,
        }
    })
}

/// Extracts article text from an already-fetched page.
///
/// # Errors
///
/// Returns the [`ExtractionFailure`] describing why no text was produced.
pub fn extract_from_html(
    html: &str,
    container_pattern: &Regex,
    excluded_markers: &[String],
) -> Result<String, ExtractionFailure> {
    let document = Html::parse_document(html);
    let container =
        find_container(&document, container_pattern).ok_or(ExtractionFailure::ContainerNotFound)?;

    if container.text().all(|t| t.trim().is_empty()) {
        return Err(ExtractionFailure::EmptyContainer);
    }

    let paragraphs = collect_paragraphs(container)?;

    let has_exclude_marker = container.select(&WITH_CLASS).any(|el| has_exclude_class(&el));

    let text = paragraphs
        .into_iter()
        .filter(|p| !is_caption(p))
        .filter(|p| !(has_exclude_marker && p.select(&WITH_CLASS).any(|el| has_exclude_class(&el))))
        .filter(|p| {
            !attribute_values(p).any(|value| {
                excluded_markers
                    .iter()
                    .any(|marker| value.contains(marker.as_str()))
            })
        })
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(text)
}

/// Content container lookup: div by class, article by class, div by id.
fn find_container<'a>(document: &'a Html, pattern: &Regex) -> Option<ElementRef<'a>> {
    let by_class = |selector: &Selector| {
        document
            .select(selector)
            .find(|el| el.value().attr("class").is_some_and(|c| class_is_match(c, pattern)))
    };

    by_class(&DIV_WITH_CLASS)
        .or_else(|| by_class(&ARTICLE_WITH_CLASS))
        .or_else(|| {
            document
                .select(&DIV_WITH_ID)
                .find(|el| el.value().attr("id").is_some_and(|id| pattern.is_match(id)))
        })
}

fn class_is_match(class: &str, pattern: &Regex) -> bool {
    pattern.is_match(class) || class.split_whitespace().any(|c| pattern.is_match(c))
}

/// `<p>` elements, or elements with a "paragraph" class when there are too
/// few of those.
fn collect_paragraphs(container: ElementRef<'_>) -> Result<Vec<ElementRef<'_>>, ExtractionFailure> {
    let paragraphs: Vec<_> = container.select(&PARAGRAPH).collect();
    if paragraphs.len() >= MIN_PARAGRAPHS {
        return Ok(paragraphs);
    }

    let classed: Vec<_> = container
        .select(&WITH_CLASS)
        .filter(|el| {
            el.value()
                .attr("class")
                .is_some_and(|c| c.contains("paragraph"))
        })
        .collect();
    if classed.len() >= MIN_PARAGRAPHS {
        return Ok(classed);
    }

    Err(ExtractionFailure::TooFewParagraphs(
        paragraphs.len().max(classed.len()),
    ))
}

fn is_caption(element: &ElementRef<'_>) -> bool {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|parent| parent.value().name() == "figcaption")
}

fn has_exclude_class(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|c| c.contains("exclude"))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;

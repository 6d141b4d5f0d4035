//! Article link discovery across a site's listing pages.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use newsdb_core::SiteProfile;
use regex::Regex;
use scraper::{Html, Selector};

use crate::client::NewsClient;
use crate::error::ScraperError;
use crate::pagination::{find_next_href, pagination_suffix};
use crate::urls::{canonicalize_link, listing_page};

static WITH_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[href]").expect("static selector is valid"));

/// Link patterns of a [`SiteProfile`], compiled once per discovery run.
#[derive(Debug, Clone)]
pub struct LinkPatterns {
    pub include: Regex,
    pub exclude: Vec<Regex>,
}

impl LinkPatterns {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidPattern`] for the first pattern that
    /// does not compile.
    pub fn from_site(site: &SiteProfile) -> Result<Self, ScraperError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| ScraperError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        };
        Ok(Self {
            include: compile(&site.url_filter)?,
            exclude: site
                .url_exclusion
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
        })
    }

    #[must_use]
    pub fn accepts(&self, href: &str) -> bool {
        self.include.is_match(href) && !self.exclude.iter().any(|re| re.is_match(href))
    }
}

/// What one listing page yields: raw matching hrefs and the pagination link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub hrefs: BTreeSet<String>,
    pub next_href: Option<String>,
}

/// Parses a listing page. Any element with an `href` counts, since some
/// sites put article links on headings rather than anchors.
#[must_use]
pub fn parse_listing(html: &str, patterns: &LinkPatterns, pagin_filter: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let hrefs = document
        .select(&WITH_HREF)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| patterns.accepts(href))
        .map(str::to_string)
        .collect();
    ListingPage {
        hrefs,
        next_href: find_next_href(&document, pagin_filter),
    }
}

/// Collects canonical article URLs from every listing page of `site`,
/// following pagination up to `depth` pages per listing.
///
/// A politeness pause precedes each listing request. Pagination for a page
/// stops early when no "next" link is found.
///
/// # Errors
///
/// Any failure is wrapped in [`ScraperError::Discovery`] naming the site.
pub async fn discover_urls(
    client: &NewsClient,
    site: &SiteProfile,
    depth: u32,
) -> Result<BTreeSet<String>, ScraperError> {
    discover_inner(client, site, depth)
        .await
        .map_err(|source| ScraperError::Discovery {
            domain: site.domain.clone(),
            source: Box::new(source),
        })
}

async fn discover_inner(
    client: &NewsClient,
    site: &SiteProfile,
    depth: u32,
) -> Result<BTreeSet<String>, ScraperError> {
    let patterns = LinkPatterns::from_site(site)?;
    let mut links = BTreeSet::new();

    for page in &site.pages {
        let listing = listing_page(&site.domain, page);
        let mut suffix = String::new();

        for level in 1..=depth.max(1) {
            let url = format!("{}{listing}{suffix}", client.url_start());
            client.polite_pause().await;
            let html = client.fetch_html(&url).await?;
            let parsed = parse_listing(&html, &patterns, &site.pagin_filter);

            let before = links.len();
            links.extend(
                parsed
                    .hrefs
                    .iter()
                    .filter_map(|href| {
                        canonicalize_link(href, &site.domain, &listing, client.scheme())
                    }),
            );
            tracing::debug!(
                domain = %site.domain,
                url = %url,
                level,
                new_links = links.len() - before,
                "listing page scanned"
            );

            match parsed
                .next_href
                .map(|href| pagination_suffix(&href, &listing))
                .filter(|s| !s.is_empty())
            {
                Some(next) => suffix = next,
                None => break,
            }
        }
    }

    tracing::info!(domain = %site.domain, links = links.len(), "discovery finished");
    Ok(links)
}

//! Link canonicalization for discovered article URLs.

use reqwest::Url;

/// Lowercased host with port, minus a leading `www.`.
fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// Listing page path as `domain[/path]`, e.g. `huffpost.com/news`.
#[must_use]
pub fn listing_page(domain: &str, page: &str) -> String {
    if page == "/" {
        domain.to_string()
    } else {
        format!("{domain}{page}")
    }
}

/// Turns a raw `href` from a listing page into a canonical absolute article
/// URL on `domain`, or `None` if it must be dropped.
///
/// Relative links get `scheme://domain` prepended. Absolute links must point
/// at `domain` (ignoring `www.`) and lose their `www.`. Query strings and
/// fragments are removed. Links back to the listing page itself are dropped.
#[must_use]
pub fn canonicalize_link(href: &str, domain: &str, listing: &str, scheme: &str) -> Option<String> {
    let href = href.trim();
    let candidate = if href.starts_with("//") {
        format!("{scheme}:{href}")
    } else if href.starts_with('/') {
        format!("{scheme}://{domain}{href}")
    } else {
        href.to_string()
    };

    let mut url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = bare_host(&url)?;
    if !host.eq_ignore_ascii_case(domain) {
        return None;
    }

    url.set_query(None);
    url.set_fragment(None);
    if let Some(stripped) = url.host_str().and_then(|h| h.strip_prefix("www.")) {
        let stripped = stripped.to_string();
        url.set_host(Some(&stripped)).ok()?;
    }

    let canonical = url.to_string();
    if is_listing_page(&canonical, listing) {
        return None;
    }
    Some(canonical)
}

fn is_listing_page(canonical: &str, listing: &str) -> bool {
    let without_scheme = canonical
        .split_once("://")
        .map_or(canonical, |(_, rest)| rest);
    without_scheme.trim_end_matches('/') == listing.trim_end_matches('/')
}

//! Request ordering for draining the scrape queue.

use std::collections::VecDeque;

use newsdb_core::{domain_of, find_site, SiteProfile};

/// Orders `urls` round-robin by domain: one URL from each domain per round,
/// domains in order of first appearance, URLs within a domain in input order.
///
/// Consecutive requests then mostly hit different hosts, so the politeness
/// pause is only needed once a single domain is left.
pub(crate) fn interleave_by_domain<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut groups: Vec<(String, VecDeque<String>)> = Vec::new();
    let mut total = 0usize;
    for url in urls {
        let domain = domain_of(&url);
        match groups.iter_mut().find(|(d, _)| *d == domain) {
            Some((_, queue)) => queue.push_back(url),
            None => groups.push((domain, VecDeque::from([url]))),
        }
        total += 1;
    }

    let mut ordered = Vec::with_capacity(total);
    while ordered.len() < total {
        for (_, queue) in &mut groups {
            if let Some(url) = queue.pop_front() {
                ordered.push(url);
            }
        }
    }
    ordered
}

/// One step of draining the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DrainStep<'s> {
    /// No site profile matches the URL's domain; it stays queued.
    Unconfigured(String),
    Fetch {
        url: String,
        site: &'s SiteProfile,
        /// Pause before fetching: the previous fetch hit the same domain.
        pause: bool,
    },
}

/// Resolves each URL of an already ordered queue to its site profile and
/// decides where the politeness pause goes.
///
/// Only fetched URLs count as the previous request; an unconfigured URL in
/// between does not reset the domain.
pub(crate) fn plan_drain<'s>(ordered: Vec<String>, sites: &'s [SiteProfile]) -> Vec<DrainStep<'s>> {
    let mut previous_domain: Option<String> = None;
    ordered
        .into_iter()
        .map(|url| {
            let domain = domain_of(&url);
            let Some(site) = find_site(sites, &domain) else {
                return DrainStep::Unconfigured(url);
            };
            let pause = previous_domain.as_deref() == Some(domain.as_str());
            previous_domain = Some(domain);
            DrainStep::Fetch { url, site, pause }
        })
        .collect()
}

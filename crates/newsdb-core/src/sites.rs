use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Crawl behaviour for one news domain.
///
/// Every site-specific decision (which listing pages to walk, which links
/// are articles, where the body lives, which paragraphs are boilerplate,
/// how pagination is marked up) is data in this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Bare host without scheme or `www.`, e.g. `apnews.com`.
    pub domain: String,
    /// Listing-page paths; `/` is the site root.
    pub pages: Vec<String>,
    /// Regex a link must match to be treated as an article.
    pub url_filter: String,
    /// Regexes that disqualify an otherwise matching link.
    #[serde(default)]
    pub url_exclusion: Vec<String>,
    /// Regex matched against class names (then ids) to find the body container.
    pub div_filter: String,
    /// Attribute substrings that mark a paragraph as boilerplate.
    #[serde(default)]
    pub p_attr_exclusion: Vec<String>,
    /// Class pattern or aria-label of the "next page" control. Empty disables pagination.
    #[serde(default)]
    pub pagin_filter: String,
}

impl SiteProfile {
    /// Compiles every regex in the profile, reporting the first that fails.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the site and the bad pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site domain must be non-empty".to_string(),
            ));
        }
        if self.domain.contains("://") || self.domain.starts_with("www.") {
            return Err(ConfigError::Validation(format!(
                "site domain '{}' must be a bare host without scheme or www.",
                self.domain
            )));
        }
        if self.pages.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has no listing pages",
                self.domain
            )));
        }
        if let Some(page) = self.pages.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Validation(format!(
                "site '{}' page '{page}' must start with '/'",
                self.domain
            )));
        }

        let patterns = std::iter::once(&self.url_filter)
            .chain(self.url_exclusion.iter())
            .chain(std::iter::once(&self.div_filter))
            .chain(std::iter::once(&self.pagin_filter).filter(|p| !p.is_empty()));
        for pattern in patterns {
            Regex::new(pattern).map_err(|e| {
                ConfigError::Validation(format!(
                    "site '{}' has invalid pattern '{pattern}': {e}",
                    self.domain
                ))
            })?;
        }

        if self.div_filter.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty div_filter",
                self.domain
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SiteProfile>,
}

impl SitesFile {
    /// See [`find_site`].
    #[must_use]
    pub fn find(&self, domain: &str) -> Option<&SiteProfile> {
        find_site(&self.sites, domain)
    }
}

/// Finds the profile for `domain`, ignoring ASCII case.
#[must_use]
pub fn find_site<'a>(sites: &'a [SiteProfile], domain: &str) -> Option<&'a SiteProfile> {
    sites.iter().find(|s| s.domain.eq_ignore_ascii_case(domain))
}

/// Load and validate the site profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_sites(&content, &path.display().to_string())
}

pub(crate) fn parse_sites(content: &str, origin: &str) -> Result<SitesFile, ConfigError> {
    let sites_file: SitesFile =
        serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
            path: origin.to_string(),
            source: e,
        })?;

    validate_sites(&sites_file)?;
    Ok(sites_file)
}

fn validate_sites(sites_file: &SitesFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for site in &sites_file.sites {
        site.validate()?;
        if !seen.insert(site.domain.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site domain: '{}'",
                site.domain
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
sites:
  - domain: apnews.com
    pages: ["/", "/hub/world-news"]
    url_filter: "/article/"
    url_exclusion: ["/article/videos-"]
    div_filter: "Article|Body"
    p_attr_exclusion: ["social-caption"]
    pagin_filter: ""
  - domain: vox.com
    pages: ["/"]
    url_filter: "/\\d+/\\d+/\\d+/"
    div_filter: "c-entry-content"
"#;

    #[test]
    fn parses_valid_sites_file() {
        let file = parse_sites(VALID, "inline").unwrap();
        assert_eq!(file.sites.len(), 2);
        let vox = file.find("vox.com").unwrap();
        assert!(vox.url_exclusion.is_empty());
        assert!(vox.pagin_filter.is_empty());
    }

    #[test]
    fn site_lookup_ignores_case() {
        let file = parse_sites(VALID, "inline").unwrap();
        assert_eq!(file.find("VOX.com").map(|s| s.domain.as_str()), Some("vox.com"));
        assert!(find_site(&file.sites, "bbc.com").is_none());
    }

    #[test]
    fn rejects_invalid_regex() {
        let yaml = r#"
sites:
  - domain: example.com
    pages: ["/"]
    url_filter: "(unclosed"
    div_filter: "body"
"#;
        let err = parse_sites(yaml, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("(unclosed")));
    }

    #[test]
    fn rejects_duplicate_domain() {
        let yaml = r#"
sites:
  - domain: example.com
    pages: ["/"]
    url_filter: "/a/"
    div_filter: "body"
  - domain: Example.com
    pages: ["/news"]
    url_filter: "/b/"
    div_filter: "body"
"#;
        let err = parse_sites(yaml, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn rejects_domain_with_scheme() {
        let yaml = r#"
sites:
  - domain: https://example.com
    pages: ["/"]
    url_filter: "/a/"
    div_filter: "body"
"#;
        assert!(parse_sites(yaml, "inline").is_err());
    }

    #[test]
    fn rejects_relative_page_without_slash() {
        let yaml = r#"
sites:
  - domain: example.com
    pages: ["news"]
    url_filter: "/a/"
    div_filter: "body"
"#;
        assert!(parse_sites(yaml, "inline").is_err());
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse_sites("sites: [", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::FileParse { .. }));
    }
}

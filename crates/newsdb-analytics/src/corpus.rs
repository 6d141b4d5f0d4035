//! Aggregate reports over the stored article corpus.
//!
//! A [`Corpus`] builds one word-frequency table over every article up front.
//! Single-token keywords and country names are answered from it; only
//! phrases are scanned article by article.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use newsdb_core::Article;
use serde::Serialize;

use crate::countries::{CountryHits, CountryTable};
use crate::error::AnalyticsError;
use crate::frequency::WordFrequency;
use crate::matcher::{Matcher, Pattern};

/// Label for articles in which no keyword of any category occurs.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordHits {
    pub keyword: String,
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryHits {
    pub category: String,
    pub articles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCategoryHits {
    pub date: NaiveDate,
    pub category: String,
    pub articles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCategoryHits {
    pub domain: String,
    pub category: String,
    pub articles: usize,
}

/// Keyword occurrences summed over one scrape date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordDateHits {
    pub date: NaiveDate,
    pub first: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub total_articles: usize,
    pub scrape_days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub articles_per_domain: BTreeMap<String, usize>,
}

/// The stored articles together with the keyword matcher.
#[derive(Debug)]
pub struct Corpus<'a> {
    articles: &'a [Article],
    matcher: &'a Matcher,
    words: WordFrequency<'a>,
}

impl<'a> Corpus<'a> {
    #[must_use]
    pub fn new(articles: &'a [Article], matcher: &'a Matcher) -> Self {
        let words = WordFrequency::from_texts(articles.iter().map(|a| a.content.as_str()));
        tracing::debug!(
            articles = articles.len(),
            tokens = words.total_tokens(),
            distinct = words.distinct_tokens(),
            "corpus word table built"
        );
        Self {
            articles,
            matcher,
            words,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    fn texts(&self) -> impl Iterator<Item = &'a str> + Clone {
        self.articles.iter().map(|a| a.content.as_str())
    }

    /// Main category of each article, in article order.
    fn labels(&self) -> Vec<&str> {
        self.articles
            .iter()
            .map(|a| self.matcher.classify(&a.content).unwrap_or(UNCATEGORIZED))
            .collect()
    }

    /// Total occurrences of every keyword, most frequent first. Keywords
    /// that never occur are left out.
    #[must_use]
    pub fn top_keywords(&self) -> Vec<KeywordHits> {
        let mut hits: Vec<KeywordHits> = self
            .matcher
            .keywords()
            .map(|(category, k)| {
                let count = match &k.pattern {
                    Pattern::Token(token) => self.words.count(token),
                    Pattern::Phrase { .. } => self.texts().map(|t| k.pattern.count(t)).sum(),
                };
                KeywordHits {
                    keyword: k.keyword.clone(),
                    category: category.to_string(),
                    count,
                }
            })
            .filter(|h| h.count > 0)
            .collect();
        hits.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
        hits
    }

    /// Number of articles per main category, largest first.
    #[must_use]
    pub fn top_categories(&self) -> Vec<CategoryHits> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in self.labels() {
            *counts.entry(label).or_insert(0) += 1;
        }
        let mut hits: Vec<CategoryHits> = counts
            .into_iter()
            .map(|(category, articles)| CategoryHits {
                category: category.to_string(),
                articles,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.articles
                .cmp(&a.articles)
                .then_with(|| a.category.cmp(&b.category))
        });
        hits
    }

    /// Articles per main category for each scrape date. Oldest date first,
    /// then largest category.
    #[must_use]
    pub fn categories_by_date(&self) -> Vec<DateCategoryHits> {
        let mut counts: BTreeMap<(NaiveDate, &str), usize> = BTreeMap::new();
        for (article, label) in self.articles.iter().zip(self.labels()) {
            *counts.entry((article.scrape_date, label)).or_insert(0) += 1;
        }
        let mut hits: Vec<DateCategoryHits> = counts
            .into_iter()
            .map(|((date, category), articles)| DateCategoryHits {
                date,
                category: category.to_string(),
                articles,
            })
            .collect();
        hits.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| b.articles.cmp(&a.articles))
                .then_with(|| a.category.cmp(&b.category))
        });
        hits
    }

    /// Articles per main category for each site, grouped by domain.
    #[must_use]
    pub fn categories_by_domain(&self) -> Vec<DomainCategoryHits> {
        let mut counts: BTreeMap<(String, &str), usize> = BTreeMap::new();
        for (article, label) in self.articles.iter().zip(self.labels()) {
            *counts.entry((article.domain(), label)).or_insert(0) += 1;
        }
        let mut hits: Vec<DomainCategoryHits> = counts
            .into_iter()
            .map(|((domain, category), articles)| DomainCategoryHits {
                domain,
                category: category.to_string(),
                articles,
            })
            .collect();
        hits.sort_by(|a, b| {
            a.domain
                .cmp(&b.domain)
                .then_with(|| b.articles.cmp(&a.articles))
                .then_with(|| a.category.cmp(&b.category))
        });
        hits
    }

    /// Occurrences of one or two keywords summed per scrape date, oldest
    /// first. Every date with articles appears, even when both counts are 0.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidPattern`] if a keyword cannot be
    /// compiled.
    pub fn keywords_by_date(
        &self,
        first: &str,
        second: Option<&str>,
    ) -> Result<Vec<KeywordDateHits>, AnalyticsError> {
        // A keyword that normalizes to nothing counts zero everywhere.
        let first = Pattern::new(first)?;
        let second = second.map(Pattern::new).transpose()?;
        let count = |pattern: Option<&Pattern>, text: &str| pattern.map_or(0, |p| p.count(text));

        let mut by_date: BTreeMap<NaiveDate, KeywordDateHits> = BTreeMap::new();
        for article in self.articles {
            let entry = by_date
                .entry(article.scrape_date)
                .or_insert_with(|| KeywordDateHits {
                    date: article.scrape_date,
                    first: 0,
                    second: second.as_ref().map(|_| 0),
                });
            entry.first += count(first.as_ref(), &article.content);
            if let (Some(total), Some(pattern)) = (entry.second.as_mut(), second.as_ref()) {
                *total += count(pattern.as_ref(), &article.content);
            }
        }
        Ok(by_date.into_values().collect())
    }

    /// Country mentions across the corpus, using the shared word table for
    /// single-word names.
    #[must_use]
    pub fn country_mentions(&self, table: &CountryTable) -> Vec<CountryHits> {
        table.mentions(self.texts(), &self.words)
    }

    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        let days: BTreeSet<NaiveDate> = self.articles.iter().map(|a| a.scrape_date).collect();
        let mut per_domain = BTreeMap::new();
        for article in self.articles {
            *per_domain.entry(article.domain()).or_insert(0) += 1;
        }
        CorpusStats {
            total_articles: self.articles.len(),
            scrape_days: days.len(),
            first_date: days.first().copied(),
            last_date: days.last().copied(),
            articles_per_domain: per_domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdb_core::Category;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn article(url: &str, day: u32, content: &str) -> Article {
        Article {
            url: url.to_string(),
            scrape_date: date(day),
            content: content.to_string(),
        }
    }

    fn matcher() -> Matcher {
        Matcher::new(&[
            Category {
                id: 1,
                name: "business".to_string(),
                keywords: vec!["inflation".to_string(), "interest rate".to_string()],
            },
            Category {
                id: 2,
                name: "climate".to_string(),
                keywords: vec!["flood".to_string(), "climate change".to_string()],
            },
        ])
        .unwrap()
    }

    fn articles() -> Vec<Article> {
        vec![
            article("https://www.vox.com/a", 1, "inflation interest rate inflation"),
            article("https://vox.com/b", 1, "flood climate change warning"),
            article("https://apnews.com/article/c", 2, "flood flood inflation"),
            article("https://apnews.com/article/d", 3, "quiet weekend weather"),
        ]
    }

    #[test]
    fn top_keywords_combines_tokens_and_phrases() {
        let (articles, matcher) = (articles(), matcher());
        let corpus = Corpus::new(&articles, &matcher);
        let top = corpus.top_keywords();
        let listed: Vec<_> = top.iter().map(|h| (h.keyword.as_str(), h.count)).collect();
        assert_eq!(
            listed,
            vec![
                ("flood", 3),
                ("inflation", 3),
                ("climate change", 1),
                ("interest rate", 1),
            ]
        );
        assert_eq!(top[0].category, "climate");
    }

    #[test]
    fn top_categories_counts_articles_by_main_category() {
        let (articles, matcher) = (articles(), matcher());
        let corpus = Corpus::new(&articles, &matcher);
        let top = corpus.top_categories();
        assert_eq!(
            top,
            vec![
                CategoryHits {
                    category: "climate".to_string(),
                    articles: 2,
                },
                CategoryHits {
                    category: "business".to_string(),
                    articles: 1,
                },
                CategoryHits {
                    category: UNCATEGORIZED.to_string(),
                    articles: 1,
                },
            ]
        );
    }

    #[test]
    fn categories_by_date_orders_oldest_first() {
        let (articles, matcher) = (articles(), matcher());
        let corpus = Corpus::new(&articles, &matcher);
        let rows = corpus.categories_by_date();
        let listed: Vec<_> = rows
            .iter()
            .map(|r| (r.date, r.category.as_str(), r.articles))
            .collect();
        assert_eq!(
            listed,
            vec![
                (date(1), "business", 1),
                (date(1), "climate", 1),
                (date(2), "climate", 1),
                (date(3), UNCATEGORIZED, 1),
            ]
        );
    }

    #[test]
    fn categories_by_domain_ignores_www() {
        let (articles, matcher) = (articles(), matcher());
        let corpus = Corpus::new(&articles, &matcher);
        let rows = corpus.categories_by_domain();
        assert!(rows.iter().all(|r| r.domain == "apnews.com" || r.domain == "vox.com"));
        let vox: usize = rows
            .iter()
            .filter(|r| r.domain == "vox.com")
            .map(|r| r.articles)
            .sum();
        assert_eq!(vox, 2);
    }

    #[test]
    fn keywords_by_date_sums_per_day() {
        let (articles, matcher) = (articles(), matcher());
        let corpus = Corpus::new(&articles, &matcher);
        let rows = corpus.keywords_by_date("inflation", Some("flood")).unwrap();
        assert_eq!(
            rows,
            vec![
                KeywordDateHits {
                    date: date(1),
                    first: 2,
                    second: Some(1),
                },
                KeywordDateHits {
                    date: date(2),
                    first: 1,
                    second: Some(2),
                },
                KeywordDateHits {
                    date: date(3),
                    first: 0,
                    second: Some(0),
                },
            ]
        );
    }

    #[test]
    fn keywords_by_date_with_one_keyword() {
        let (articles, matcher) = (articles(), matcher());
        let corpus = Corpus::new(&articles, &matcher);
        let rows = corpus.keywords_by_date("climate change", None).unwrap();
        assert_eq!(rows[0].first, 1);
        assert!(rows.iter().all(|r| r.second.is_none()));
    }

    #[test]
    fn country_mentions_use_corpus_words() {
        let articles = vec![
            article("https://a.test/1", 1, "ukraine russia talks"),
            article("https://a.test/2", 1, "ukraine aid south africa"),
        ];
        let matcher = Matcher::default();
        let corpus = Corpus::new(&articles, &matcher);
        let table = CountryTable::builtin().unwrap();
        let hits = corpus.country_mentions(&table);
        assert_eq!(hits[0].country, "ukraine");
        assert_eq!(hits[0].count, 2);
        assert!(hits.iter().any(|h| h.iso3 == "ZAF" && h.count == 1));
    }

    #[test]
    fn stats_cover_dates_and_domains() {
        let (articles, matcher) = (articles(), matcher());
        let stats = Corpus::new(&articles, &matcher).stats();
        assert_eq!(stats.total_articles, 4);
        assert_eq!(stats.scrape_days, 3);
        assert_eq!(stats.first_date, Some(date(1)));
        assert_eq!(stats.last_date, Some(date(3)));
        assert_eq!(stats.articles_per_domain.get("apnews.com"), Some(&2));
    }

    #[test]
    fn empty_corpus_has_empty_reports() {
        let matcher = matcher();
        let corpus = Corpus::new(&[], &matcher);
        assert!(corpus.is_empty());
        assert!(corpus.top_keywords().is_empty());
        assert!(corpus.top_categories().is_empty());
        assert_eq!(corpus.stats().first_date, None);
    }
}

//! Country mention counting.
//!
//! Names are matched against normalized article text through the same
//! [`Pattern`] rules as keywords. Some countries go by several names; their
//! counts are merged under one display name after counting.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::AnalyticsError;
use crate::frequency::WordFrequency;
use crate::matcher::Pattern;

/// Lowercase English country names and their ISO 3166-1 alpha-3 codes.
const COUNTRIES: &[(&str, &str)] = &[
    ("afghanistan", "AFG"),
    ("albania", "ALB"),
    ("algeria", "DZA"),
    ("andorra", "AND"),
    ("angola", "AGO"),
    ("argentina", "ARG"),
    ("armenia", "ARM"),
    ("australia", "AUS"),
    ("austria", "AUT"),
    ("azerbaijan", "AZE"),
    ("bahamas", "BHS"),
    ("bahrain", "BHR"),
    ("bangladesh", "BGD"),
    ("barbados", "BRB"),
    ("belarus", "BLR"),
    ("belgium", "BEL"),
    ("belize", "BLZ"),
    ("benin", "BEN"),
    ("bhutan", "BTN"),
    ("bolivia", "BOL"),
    ("bosnia and herzegovina", "BIH"),
    ("botswana", "BWA"),
    ("brazil", "BRA"),
    ("brunei", "BRN"),
    ("bulgaria", "BGR"),
    ("burkina faso", "BFA"),
    ("burundi", "BDI"),
    ("cambodia", "KHM"),
    ("cameroon", "CMR"),
    ("canada", "CAN"),
    ("cape verde", "CPV"),
    ("central african republic", "CAF"),
    ("chad", "TCD"),
    ("chile", "CHL"),
    ("china", "CHN"),
    ("colombia", "COL"),
    ("comoros", "COM"),
    ("congo", "COG"),
    ("costa rica", "CRI"),
    ("croatia", "HRV"),
    ("cuba", "CUB"),
    ("cyprus", "CYP"),
    ("czechia", "CZE"),
    ("denmark", "DNK"),
    ("djibouti", "DJI"),
    ("dominica", "DMA"),
    ("dominican republic", "DOM"),
    ("ecuador", "ECU"),
    ("egypt", "EGY"),
    ("el salvador", "SLV"),
    ("equatorial guinea", "GNQ"),
    ("eritrea", "ERI"),
    ("estonia", "EST"),
    ("eswatini", "SWZ"),
    ("ethiopia", "ETH"),
    ("fiji", "FJI"),
    ("finland", "FIN"),
    ("france", "FRA"),
    ("gabon", "GAB"),
    ("gambia", "GMB"),
    ("georgia", "GEO"),
    ("germany", "DEU"),
    ("ghana", "GHA"),
    ("greece", "GRC"),
    ("greenland", "GRL"),
    ("grenada", "GRD"),
    ("guatemala", "GTM"),
    ("guinea", "GIN"),
    ("guinea-bissau", "GNB"),
    ("guyana", "GUY"),
    ("haiti", "HTI"),
    ("honduras", "HND"),
    ("hong kong", "HKG"),
    ("hungary", "HUN"),
    ("iceland", "ISL"),
    ("india", "IND"),
    ("indonesia", "IDN"),
    ("iran", "IRN"),
    ("iraq", "IRQ"),
    ("ireland", "IRL"),
    ("israel", "ISR"),
    ("italy", "ITA"),
    ("jamaica", "JAM"),
    ("japan", "JPN"),
    ("jordan", "JOR"),
    ("kazakhstan", "KAZ"),
    ("kenya", "KEN"),
    ("kiribati", "KIR"),
    ("kosovo", "XKX"),
    ("kuwait", "KWT"),
    ("kyrgyzstan", "KGZ"),
    ("laos", "LAO"),
    ("latvia", "LVA"),
    ("lebanon", "LBN"),
    ("lesotho", "LSO"),
    ("liberia", "LBR"),
    ("libya", "LBY"),
    ("liechtenstein", "LIE"),
    ("lithuania", "LTU"),
    ("luxembourg", "LUX"),
    ("madagascar", "MDG"),
    ("malawi", "MWI"),
    ("malaysia", "MYS"),
    ("maldives", "MDV"),
    ("mali", "MLI"),
    ("malta", "MLT"),
    ("mauritania", "MRT"),
    ("mauritius", "MUS"),
    ("mexico", "MEX"),
    ("moldova", "MDA"),
    ("monaco", "MCO"),
    ("mongolia", "MNG"),
    ("montenegro", "MNE"),
    ("morocco", "MAR"),
    ("mozambique", "MOZ"),
    ("myanmar", "MMR"),
    ("namibia", "NAM"),
    ("nepal", "NPL"),
    ("netherlands", "NLD"),
    ("new zealand", "NZL"),
    ("nicaragua", "NIC"),
    ("niger", "NER"),
    ("nigeria", "NGA"),
    ("north korea", "PRK"),
    ("north macedonia", "MKD"),
    ("norway", "NOR"),
    ("oman", "OMN"),
    ("pakistan", "PAK"),
    ("palestine", "PSE"),
    ("panama", "PAN"),
    ("papua new guinea", "PNG"),
    ("paraguay", "PRY"),
    ("peru", "PER"),
    ("philippines", "PHL"),
    ("poland", "POL"),
    ("portugal", "PRT"),
    ("qatar", "QAT"),
    ("romania", "ROU"),
    ("russia", "RUS"),
    ("rwanda", "RWA"),
    ("samoa", "WSM"),
    ("san marino", "SMR"),
    ("saudi arabia", "SAU"),
    ("senegal", "SEN"),
    ("serbia", "SRB"),
    ("seychelles", "SYC"),
    ("sierra leone", "SLE"),
    ("singapore", "SGP"),
    ("slovakia", "SVK"),
    ("slovenia", "SVN"),
    ("solomon islands", "SLB"),
    ("somalia", "SOM"),
    ("south africa", "ZAF"),
    ("south korea", "KOR"),
    ("south sudan", "SSD"),
    ("spain", "ESP"),
    ("sri lanka", "LKA"),
    ("sudan", "SDN"),
    ("suriname", "SUR"),
    ("sweden", "SWE"),
    ("switzerland", "CHE"),
    ("syria", "SYR"),
    ("taiwan", "TWN"),
    ("tajikistan", "TJK"),
    ("tanzania", "TZA"),
    ("thailand", "THA"),
    ("timor-leste", "TLS"),
    ("togo", "TGO"),
    ("tonga", "TON"),
    ("trinidad and tobago", "TTO"),
    ("tunisia", "TUN"),
    ("turkey", "TUR"),
    ("turkmenistan", "TKM"),
    ("uganda", "UGA"),
    ("ukraine", "UKR"),
    ("united arab emirates", "ARE"),
    ("united kingdom", "GBR"),
    ("united states", "USA"),
    ("uruguay", "URY"),
    ("uzbekistan", "UZB"),
    ("vanuatu", "VUT"),
    ("venezuela", "VEN"),
    ("vietnam", "VNM"),
    ("yemen", "YEM"),
    ("zambia", "ZMB"),
    ("zimbabwe", "ZWE"),
];

/// Alternative names folded into a canonical entry after counting.
const VARIANTS: &[(&str, &str)] = &[
    ("usa", "united states"),
    ("america", "united states"),
    ("uk", "united kingdom"),
    ("england", "united kingdom"),
];

/// Mentions of one country across the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryHits {
    pub country: String,
    pub iso3: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
struct CountryPattern {
    /// Display name the count is reported under.
    canonical: String,
    iso3: String,
    pattern: Pattern,
}

/// Compiled country-name patterns, variants included.
#[derive(Debug, Clone)]
pub struct CountryTable {
    entries: Vec<CountryPattern>,
}

impl CountryTable {
    /// The built-in English name table with its variant spellings.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidPattern`] if a name cannot be compiled.
    pub fn builtin() -> Result<Self, AnalyticsError> {
        let iso3_of = |name: &str| {
            COUNTRIES
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, iso3)| *iso3)
        };

        let variants = VARIANTS.iter().filter_map(|(variant, canonical)| {
            iso3_of(canonical).map(|iso3| (*variant, *canonical, iso3))
        });
        let entries = COUNTRIES
            .iter()
            .map(|(name, iso3)| (*name, *name, *iso3))
            .chain(variants);

        Self::from_entries(entries)
    }

    /// Builds a table from `(name, canonical name, iso3)` triples.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidPattern`] if a name cannot be compiled.
    pub fn from_entries<'e, I>(entries: I) -> Result<Self, AnalyticsError>
    where
        I: IntoIterator<Item = (&'e str, &'e str, &'e str)>,
    {
        let mut compiled = Vec::new();
        for (name, canonical, iso3) in entries {
            if let Some(pattern) = Pattern::new(name)? {
                compiled.push(CountryPattern {
                    canonical: canonical.to_string(),
                    iso3: iso3.to_string(),
                    pattern,
                });
            }
        }
        Ok(Self { entries: compiled })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts every country in `texts`, most mentioned first.
    ///
    /// Single-word names are read from `words`, a frequency table over the
    /// same texts; multi-word names are matched per text. Countries that are
    /// never mentioned are left out. Equal counts are ordered by name.
    #[must_use]
    pub fn mentions<'t, I>(&self, texts: I, words: &WordFrequency<'_>) -> Vec<CountryHits>
    where
        I: IntoIterator<Item = &'t str> + Clone,
    {
        let mut merged: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for entry in &self.entries {
            let count = match &entry.pattern {
                Pattern::Token(token) => words.count(token),
                Pattern::Phrase { .. } => texts
                    .clone()
                    .into_iter()
                    .map(|text| entry.pattern.count(text))
                    .sum(),
            };
            *merged
                .entry((entry.canonical.as_str(), entry.iso3.as_str()))
                .or_insert(0) += count;
        }

        let mut hits: Vec<CountryHits> = merged
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|((country, iso3), count)| CountryHits {
                country: country.to_string(),
                iso3: iso3.to_string(),
                count,
            })
            .collect();
        hits.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentions(texts: &[&str]) -> Vec<CountryHits> {
        let table = CountryTable::builtin().unwrap();
        let words = WordFrequency::from_texts(texts.iter().copied());
        table.mentions(texts.iter().copied(), &words)
    }

    #[test]
    fn builtin_table_includes_variants() {
        let table = CountryTable::builtin().unwrap();
        assert_eq!(table.len(), COUNTRIES.len() + VARIANTS.len());
    }

    #[test]
    fn variants_merge_into_canonical_country() {
        let hits = mentions(&["usa america united states talks", "england uk britain"]);
        assert_eq!(
            hits[0],
            CountryHits {
                country: "united states".to_string(),
                iso3: "USA".to_string(),
                count: 3,
            }
        );
        assert_eq!(hits[1].country, "united kingdom");
        assert_eq!(hits[1].count, 2);
    }

    #[test]
    fn single_names_are_exact_tokens() {
        let hits = mentions(&["chinese markets", "china china"]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].iso3, "CHN");
        assert_eq!(hits[0].count, 2);
    }

    #[test]
    fn stopwords_inside_names_are_ignored() {
        // Stored text has "and" removed, so the pattern must drop it too.
        let hits = mentions(&["trinidad tobago election"]);
        assert_eq!(hits[0].country, "trinidad and tobago");
        assert_eq!(hits[0].count, 1);
    }

    #[test]
    fn unmentioned_countries_are_omitted_and_ties_sort_by_name() {
        let hits = mentions(&["peru chile"]);
        let names: Vec<_> = hits.iter().map(|h| h.country.as_str()).collect();
        assert_eq!(names, vec!["chile", "peru"]);
    }
}

//! Seed categories and keywords loaded from `config/categories.yaml`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::identifiers::validate_identifier;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategorySeed>,
}

/// Load and validate the seed categories from a YAML file.
///
/// Names and keywords are canonicalized the same way interactive edits are,
/// so a seeded keyword and a hand-added one compare equal.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, an entry fails
/// identifier validation, or a keyword appears in two categories.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_categories(&content, &path.display().to_string())
}

fn parse_categories(content: &str, origin: &str) -> Result<CategoriesFile, ConfigError> {
    let raw: CategoriesFile =
        serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
            path: origin.to_string(),
            source: e,
        })?;

    let mut seen_categories = HashSet::new();
    let mut seen_keywords = HashSet::new();
    let mut categories = Vec::with_capacity(raw.categories.len());

    for seed in raw.categories {
        let name = validate_identifier(&seed.name)
            .map_err(|e| ConfigError::Validation(format!("category '{}': {e}", seed.name)))?;
        if !seen_categories.insert(name.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category: '{name}'"
            )));
        }

        let mut keywords = Vec::with_capacity(seed.keywords.len());
        for keyword in seed.keywords {
            let keyword = validate_identifier(&keyword)
                .map_err(|e| ConfigError::Validation(format!("keyword '{keyword}': {e}")))?;
            if !seen_keywords.insert(keyword.clone()) {
                return Err(ConfigError::Validation(format!(
                    "keyword '{keyword}' is listed more than once"
                )));
            }
            keywords.push(keyword);
        }

        categories.push(CategorySeed { name, keywords });
    }

    Ok(CategoriesFile { categories })
}

//! Shared domain types, configuration, and text normalization for `newsdb`.

pub mod app_config;
pub mod categories;
pub mod config;
pub mod headers;
pub mod identifiers;
pub mod sites;
pub mod stopwords;
pub mod text;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use categories::{load_categories, CategoriesFile, CategorySeed};
pub use config::{load_app_config, load_app_config_from_env};
pub use headers::browser_headers;
pub use identifiers::{validate_identifier, ValidationError};
pub use sites::{find_site, load_sites, SiteProfile, SitesFile};
pub use text::{is_compound, normalize};
pub use types::{domain_of, Article, Category, UrlState};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

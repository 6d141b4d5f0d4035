use crate::app_config::{AppConfig, Environment};
use crate::headers::DEFAULT_USER_AGENT;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = or_default("NEWSDB_DATABASE_URL", "sqlite://newsdb.sqlite");
    let env = parse_environment(&or_default("NEWSDB_ENV", "development"))?;
    let log_level = or_default("NEWSDB_LOG_LEVEL", "info");
    let sites_path = PathBuf::from(or_default("NEWSDB_SITES_PATH", "./config/sites.yaml"));
    let categories_path = PathBuf::from(or_default(
        "NEWSDB_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let run_log_path = PathBuf::from(or_default(
        "NEWSDB_RUN_LOG_PATH",
        "./scheduled_scraper.txt",
    ));

    let db_max_connections = parse_u32("NEWSDB_DB_MAX_CONNECTIONS", "1")?;
    if db_max_connections == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "NEWSDB_DB_MAX_CONNECTIONS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let db_acquire_timeout_secs = parse_u64("NEWSDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("NEWSDB_SCRAPER_REQUEST_TIMEOUT_SECS", "10")?;
    let scraper_user_agent = or_default("NEWSDB_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_retries = parse_u32("NEWSDB_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("NEWSDB_SCRAPER_RETRY_BACKOFF_BASE_SECS", "5")?;
    let scraper_polite_delay_min_ms = parse_u64("NEWSDB_SCRAPER_POLITE_DELAY_MIN_MS", "1000")?;
    let scraper_polite_delay_max_ms = parse_u64("NEWSDB_SCRAPER_POLITE_DELAY_MAX_MS", "3000")?;
    if scraper_polite_delay_min_ms > scraper_polite_delay_max_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "NEWSDB_SCRAPER_POLITE_DELAY_MIN_MS".to_string(),
            reason: format!(
                "minimum delay {scraper_polite_delay_min_ms}ms exceeds maximum {scraper_polite_delay_max_ms}ms"
            ),
        });
    }
    let crawl_freshness_secs = parse_u64("NEWSDB_CRAWL_FRESHNESS_SECS", "3600")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        sites_path,
        categories_path,
        run_log_path,
        db_max_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        scraper_polite_delay_min_ms,
        scraper_polite_delay_max_ms,
        crawl_freshness_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEWSDB_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

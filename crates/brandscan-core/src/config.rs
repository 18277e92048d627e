use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("BRANDSCAN_ENV", "development"))?;
    let log_level = or_default("BRANDSCAN_LOG_LEVEL", "info");
    let prospects_path = PathBuf::from(or_default(
        "BRANDSCAN_PROSPECTS_PATH",
        "./config/prospects.yaml",
    ));
    let apify_api_token = optional("APIFY_API_TOKEN");
    let openai_api_key = optional("OPENAI_API_KEY");

    let db_max_connections = parse_var(&lookup, "BRANDSCAN_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_var(&lookup, "BRANDSCAN_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_var(&lookup, "BRANDSCAN_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let max_source_urls = parse_var(&lookup, "BRANDSCAN_MAX_SOURCE_URLS", "10")?;
    let max_posts_per_url = parse_var(&lookup, "BRANDSCAN_MAX_POSTS_PER_URL", "20")?;
    let max_comments_per_post = parse_var(&lookup, "BRANDSCAN_MAX_COMMENTS_PER_POST", "20")?;
    let max_concurrent_prospects = parse_var(&lookup, "BRANDSCAN_MAX_CONCURRENT_PROSPECTS", "1")?;
    let max_concurrent_scrapes = parse_var(&lookup, "BRANDSCAN_MAX_CONCURRENT_SCRAPES", "3")?;
    let insert_chunk_size = parse_var(&lookup, "BRANDSCAN_INSERT_CHUNK_SIZE", "1000")?;
    let analysis_batch_chars = parse_var(&lookup, "BRANDSCAN_ANALYSIS_BATCH_CHARS", "180000")?;
    let max_item_chars = parse_var(&lookup, "BRANDSCAN_MAX_ITEM_CHARS", "1200")?;

    let search_timeout_secs = parse_var(&lookup, "BRANDSCAN_SEARCH_TIMEOUT_SECS", "310")?;
    let scrape_timeout_secs = parse_var(&lookup, "BRANDSCAN_SCRAPE_TIMEOUT_SECS", "310")?;
    let llm_timeout_secs = parse_var(&lookup, "BRANDSCAN_LLM_TIMEOUT_SECS", "300")?;
    let llm_request_timeout_secs =
        parse_var(&lookup, "BRANDSCAN_LLM_REQUEST_TIMEOUT_SECS", "90")?;
    if llm_request_timeout_secs >= llm_timeout_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "BRANDSCAN_LLM_REQUEST_TIMEOUT_SECS".to_string(),
            reason: format!(
                "must be less than BRANDSCAN_LLM_TIMEOUT_SECS ({llm_timeout_secs}) so retries fit"
            ),
        });
    }
    let db_timeout_secs = parse_var(&lookup, "BRANDSCAN_DB_TIMEOUT_SECS", "30")?;

    let apify_max_retries = parse_var(&lookup, "BRANDSCAN_APIFY_MAX_RETRIES", "2")?;
    let apify_retry_backoff_base_secs =
        parse_var(&lookup, "BRANDSCAN_APIFY_RETRY_BACKOFF_BASE_SECS", "5")?;

    let llm_model = or_default("BRANDSCAN_LLM_MODEL", "gpt-4o");
    let llm_max_retries = parse_var(&lookup, "BRANDSCAN_LLM_MAX_RETRIES", "3")?;
    let llm_retry_backoff_base_ms = parse_var(&lookup, "BRANDSCAN_LLM_RETRY_BACKOFF_BASE_MS", "1000")?;

    let prospect_retries = parse_var(&lookup, "BRANDSCAN_PROSPECT_RETRIES", "0")?;
    let prospect_retry_delay_secs = parse_var(&lookup, "BRANDSCAN_PROSPECT_RETRY_DELAY_SECS", "30")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        prospects_path,
        apify_api_token,
        openai_api_key,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        max_source_urls,
        max_posts_per_url,
        max_comments_per_post,
        max_concurrent_prospects,
        max_concurrent_scrapes,
        insert_chunk_size,
        analysis_batch_chars,
        max_item_chars,
        search_timeout_secs,
        scrape_timeout_secs,
        llm_timeout_secs,
        llm_request_timeout_secs,
        db_timeout_secs,
        apify_max_retries,
        apify_retry_backoff_base_secs,
        llm_model,
        llm_max_retries,
        llm_retry_backoff_base_ms,
        prospect_retries,
        prospect_retry_delay_secs,
    })
}

/// Read `var` through `lookup`, falling back to `default`, and parse it.
fn parse_var<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BRANDSCAN_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Browser-like default so retailer front-ends serve the regular markup.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any value is invalid. A missing `DATABASE_URL`
/// is reported later by [`AppConfig::require_database_url`].
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
/// Returns `ConfigError` if any value is invalid. A missing `DATABASE_URL`
/// is reported later by [`AppConfig::require_database_url`].
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = lookup("DATABASE_URL")
        .ok()
        .filter(|s| !s.trim().is_empty());
    let env = parse_environment(&or_default("PRICEWATCH_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_as(
        "PRICEWATCH_BIND_ADDR",
        &or_default("PRICEWATCH_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("PRICEWATCH_LOG_LEVEL", "info");
    let products_path = PathBuf::from(or_default(
        "PRICEWATCH_PRODUCTS_PATH",
        "./config/products.yaml",
    ));

    let db_max_connections: u32 = parse_as(
        "PRICEWATCH_DB_MAX_CONNECTIONS",
        &or_default("PRICEWATCH_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "PRICEWATCH_DB_MIN_CONNECTIONS",
        &or_default("PRICEWATCH_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "PRICEWATCH_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("PRICEWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let scraper_request_timeout_secs: u64 = parse_as(
        "PRICEWATCH_SCRAPER_REQUEST_TIMEOUT_SECS",
        &or_default("PRICEWATCH_SCRAPER_REQUEST_TIMEOUT_SECS", "20"),
    )?;
    let scraper_user_agent = or_default("PRICEWATCH_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_attempts: u32 = parse_as(
        "PRICEWATCH_SCRAPER_MAX_ATTEMPTS",
        &or_default("PRICEWATCH_SCRAPER_MAX_ATTEMPTS", "3"),
    )?;
    let scraper_backoff_base_ms: u64 = parse_as(
        "PRICEWATCH_SCRAPER_BACKOFF_BASE_MS",
        &or_default("PRICEWATCH_SCRAPER_BACKOFF_BASE_MS", "500"),
    )?;
    let scraper_jitter_min_ms: u64 = parse_as(
        "PRICEWATCH_SCRAPER_JITTER_MIN_MS",
        &or_default("PRICEWATCH_SCRAPER_JITTER_MIN_MS", "2000"),
    )?;
    let scraper_jitter_max_ms: u64 = parse_as(
        "PRICEWATCH_SCRAPER_JITTER_MAX_MS",
        &or_default("PRICEWATCH_SCRAPER_JITTER_MAX_MS", "5000"),
    )?;
    let scraper_max_concurrent: usize = parse_as(
        "PRICEWATCH_SCRAPER_MAX_CONCURRENT",
        &or_default("PRICEWATCH_SCRAPER_MAX_CONCURRENT", "1"),
    )?;
    let scrape_interval_hours: u64 = parse_as(
        "PRICEWATCH_SCRAPE_INTERVAL_HOURS",
        &or_default("PRICEWATCH_SCRAPE_INTERVAL_HOURS", "24"),
    )?;
    let debug_json_path = lookup("PRICEWATCH_DEBUG_JSON_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    if scraper_max_attempts == 0 {
        return Err(invalid("PRICEWATCH_SCRAPER_MAX_ATTEMPTS", "must be at least 1"));
    }
    if scraper_backoff_base_ms == 0 {
        return Err(invalid(
            "PRICEWATCH_SCRAPER_BACKOFF_BASE_MS",
            "must be greater than 0",
        ));
    }
    if scraper_jitter_min_ms > scraper_jitter_max_ms {
        return Err(invalid(
            "PRICEWATCH_SCRAPER_JITTER_MIN_MS",
            "must not exceed PRICEWATCH_SCRAPER_JITTER_MAX_MS",
        ));
    }
    if scraper_max_concurrent == 0 {
        return Err(invalid(
            "PRICEWATCH_SCRAPER_MAX_CONCURRENT",
            "must be at least 1",
        ));
    }
    if scrape_interval_hours == 0 {
        return Err(invalid(
            "PRICEWATCH_SCRAPE_INTERVAL_HOURS",
            "must be at least 1",
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        products_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_attempts,
        scraper_backoff_base_ms,
        scraper_jitter_min_ms,
        scraper_jitter_max_ms,
        scraper_max_concurrent,
        scrape_interval_hours,
        debug_json_path,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn invalid(var: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PRICEWATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_HUB_URL: &str = "https://pubsubhubbub.appspot.com/subscribe";

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
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_num(var, default)?;
        u32::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = parse_num(var, default)?;
        usize::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let non_empty = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    // Checked lazily by `AppConfig::database_url` so commands that never
    // touch Postgres run without it.
    let database_url = non_empty("DATABASE_URL");

    let env = parse_environment(&or_default("YTMON_ENV", "development"))?;

    let raw_bind = or_default("YTMON_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = raw_bind
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "YTMON_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let log_level = or_default("YTMON_LOG_LEVEL", "info");
    let channels_path = PathBuf::from(or_default(
        "YTMON_CHANNELS_PATH",
        "./config/channels.yaml",
    ));
    let api_key = non_empty("YTMON_API_KEY");

    let db_max_connections = parse_u32("YTMON_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("YTMON_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "YTMON_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }
    let db_acquire_timeout_secs = parse_num("YTMON_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let db_statement_timeout_secs = parse_num("YTMON_DB_STATEMENT_TIMEOUT_SECS", "15")?;

    let extractor_bin = or_default("YTMON_EXTRACTOR_BIN", "yt-dlp");
    let extractor_timeout_secs = parse_num("YTMON_EXTRACTOR_TIMEOUT_SECS", "60")?;

    let hub_url = or_default("YTMON_HUB_URL", DEFAULT_HUB_URL);
    let hub_timeout_secs = parse_num("YTMON_HUB_TIMEOUT_SECS", "15")?;
    let hub_secret = non_empty("YTMON_HUB_SECRET");
    let hub_lease_seconds = match non_empty("YTMON_HUB_LEASE_SECONDS") {
        Some(raw) => Some(raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: "YTMON_HUB_LEASE_SECONDS".to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    let backfill_limit = parse_usize("YTMON_BACKFILL_LIMIT", "50")?;
    let max_concurrent_channels = parse_usize("YTMON_MAX_CONCURRENT_CHANNELS", "1")?;
    let max_concurrent_fetches = parse_usize("YTMON_MAX_CONCURRENT_FETCHES", "4")?;

    for (var, value) in [
        ("YTMON_EXTRACTOR_TIMEOUT_SECS", extractor_timeout_secs),
        ("YTMON_HUB_TIMEOUT_SECS", hub_timeout_secs),
        ("YTMON_DB_STATEMENT_TIMEOUT_SECS", db_statement_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "timeout must be greater than zero".to_string(),
            });
        }
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        channels_path,
        api_key,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        db_statement_timeout_secs,
        extractor_bin,
        extractor_timeout_secs,
        hub_url,
        hub_timeout_secs,
        hub_secret,
        hub_lease_seconds,
        backfill_limit,
        max_concurrent_channels,
        max_concurrent_fetches,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "YTMON_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

//! Application configuration - environment settings, database access, and the
//! optional starting catalog.

/// Starting catalog loading from catalog.toml
pub mod catalog;

/// Database configuration and connection management
pub mod database;

use std::time::Duration;

/// Returns the wall-clock bound for a single sale commit.
///
/// Reads `SALE_COMMIT_TIMEOUT_SECS` from the environment, falling back to
/// [`crate::core::sale::DEFAULT_COMMIT_TIMEOUT`]. Zero and unparseable
/// values are logged and ignored rather than aborting startup.
#[must_use]
pub fn sale_commit_timeout() -> Duration {
    match std::env::var("SALE_COMMIT_TIMEOUT_SECS") {
        Ok(raw) => parse_timeout_secs(&raw),
        Err(_) => crate::core::sale::DEFAULT_COMMIT_TIMEOUT,
    }
}

/// Parses a timeout in whole seconds. A commit bounded by zero seconds could
/// never finish, so zero falls back to the default like any other bad value.
fn parse_timeout_secs(raw: &str) -> Duration {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            tracing::warn!("Ignoring invalid SALE_COMMIT_TIMEOUT_SECS value: {}", raw);
            crate::core::sale::DEFAULT_COMMIT_TIMEOUT
        }
    }
}

/// Returns the starting catalog path, `CATALOG_PATH` or `./catalog.toml`.
#[must_use]
pub fn catalog_path() -> String {
    std::env::var("CATALOG_PATH").unwrap_or_else(|_| "catalog.toml".to_string())
}

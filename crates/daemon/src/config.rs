//! Environment-driven daemon configuration.
//!
//! Every knob has a default, so an empty environment yields a working
//! in-memory instance. Unparsable values fall back to the default with a
//! warning rather than refusing to start.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use camwatch_fetch::DEFAULT_FETCH_TIMEOUT;
use camwatch_manager::DEFAULT_MAX_CONCURRENT;

const DEFAULT_TICK_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Persistence root; `None` runs fully in memory.
    pub data_dir: Option<PathBuf>,
    /// Time between scheduler passes.
    pub tick: Duration,
    pub fetch_timeout: Duration,
    pub max_concurrent_refreshes: usize,
    /// Optional JSON file of camera records loaded into an empty store.
    pub seed_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("CAMWATCH_DATA_DIR").ok().map(PathBuf::from),
            tick: Duration::from_secs(parse_or_default(
                "CAMWATCH_TICK_SECS",
                std::env::var("CAMWATCH_TICK_SECS").ok().as_deref(),
                DEFAULT_TICK_SECS,
            )),
            fetch_timeout: Duration::from_secs(parse_or_default(
                "CAMWATCH_FETCH_TIMEOUT_SECS",
                std::env::var("CAMWATCH_FETCH_TIMEOUT_SECS").ok().as_deref(),
                DEFAULT_FETCH_TIMEOUT.as_secs(),
            )),
            max_concurrent_refreshes: parse_or_default(
                "CAMWATCH_MAX_CONCURRENT_REFRESHES",
                std::env::var("CAMWATCH_MAX_CONCURRENT_REFRESHES").ok().as_deref(),
                DEFAULT_MAX_CONCURRENT,
            ),
            seed_file: std::env::var("CAMWATCH_SEED").ok().map(PathBuf::from),
        }
    }
}

fn parse_or_default<T: FromStr + Copy>(key: &str, value: Option<&str>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key = %key, value = %raw, "Unparsable value, using default");
            default
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Engine configuration.
//!
//! Defaults are production-sane; every knob can be overridden through
//! `GUTENSEARCH_*` environment variables for deployment without code changes.

use std::path::PathBuf;
use std::time::Duration;

/// Tunables for the search engine and its connection pool.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the denormalized catalog database.
    pub db_path: PathBuf,
    /// Number of pooled read connections.
    pub pool_size: usize,
    /// How long a checkout may wait for a free connection.
    pub acquire_timeout: Duration,
    /// Upper bound on any single compiled query (count or fetch).
    pub statement_timeout: Duration,
    /// Minimum `word_similarity` score for a fuzzy match, in 0..1.
    pub similarity_threshold: f64,
    /// Maximum number of entries per computed facet.
    pub facet_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("gutendb.sqlite"),
            pool_size: 8,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(10),
            similarity_threshold: 0.4,
            facet_limit: 15,
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = Config::default();
        if let Ok(path) = std::env::var("GUTENSEARCH_DB") {
            cfg.db_path = PathBuf::from(path);
        }
        if let Some(n) = env_parse::<usize>("GUTENSEARCH_POOL_SIZE") {
            cfg.pool_size = n.max(1);
        }
        if let Some(ms) = env_parse::<u64>("GUTENSEARCH_ACQUIRE_TIMEOUT_MS") {
            cfg.acquire_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("GUTENSEARCH_STATEMENT_TIMEOUT_MS") {
            cfg.statement_timeout = Duration::from_millis(ms);
        }
        if let Some(t) = env_parse::<f64>("GUTENSEARCH_SIMILARITY_THRESHOLD") {
            cfg.similarity_threshold = t.clamp(0.0, 1.0);
        }
        if let Some(n) = env_parse::<usize>("GUTENSEARCH_FACET_LIMIT") {
            cfg.facet_limit = n.clamp(1, 100);
        }
        cfg
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

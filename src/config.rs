//! Runtime configuration
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! gives the standard behavior: a one-hour expire-after-access average cache,
//! a generous traversal depth guard, `info` logging to stderr and the
//! standard ten-question query plan.

use crate::error::TraceError;
use crate::report::Query;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default expire-after-access window for cached link averages
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default ceiling on traversal depth (hops from the start node)
pub const DEFAULT_MAX_DEPTH: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Memoize link averages at all
    pub enabled: bool,
    /// Expire entries this many seconds after last access; `None` keeps them
    /// until the link changes
    pub ttl_secs: Option<u64>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: Some(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Branches deeper than this are cut. Only matters for walks that would
    /// otherwise not terminate (zero or negative latency cycles).
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
    /// Also write daily-rotated log files into this directory
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub cache: CacheConfig,
    pub traversal: TraversalConfig,
    pub logging: LoggingConfig,
    /// Queries answered for every input graph
    pub queries: Vec<Query>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            traversal: TraversalConfig::default(),
            logging: LoggingConfig::default(),
            queries: Query::standard_plan(),
        }
    }
}

impl TraceConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, TraceError> {
        Ok(serde_json::from_str(raw)?)
    }
}

//! Configuration for a cube session.

use std::path::PathBuf;
use std::time::Duration;

use cube_catalog::store::{expand_path, DEFAULT_FETCH_TIMEOUT};
use cube_catalog::{DEFAULT_CATALOG_CACHE, DEFAULT_CATALOG_URL};
use serde::{Deserialize, Serialize};

/// Default number of open cubes kept by the cache.
pub const DEFAULT_CUBE_CACHE_CAPACITY: usize = 64;

/// Default limit for opening a single cube.
pub const DEFAULT_CUBE_OPEN_TIMEOUT_SECS: u64 = 120;

/// Configuration for a [`CubeSession`](crate::CubeSession).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Catalog to load when none is given explicitly.
    pub catalog_url: String,

    /// Disk cache for the default catalog.
    pub catalog_cache: PathBuf,

    /// Timeout for the catalog download in seconds.
    pub catalog_timeout_secs: u64,

    /// Maximum number of open cubes. Zero means unbounded.
    pub cube_cache_capacity: usize,

    /// Timeout for opening one cube in seconds.
    pub cube_open_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            catalog_cache: expand_path(DEFAULT_CATALOG_CACHE),
            catalog_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            cube_cache_capacity: DEFAULT_CUBE_CACHE_CAPACITY,
            cube_open_timeout_secs: DEFAULT_CUBE_OPEN_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ITSLIVE_CATALOG_URL") {
            if !val.trim().is_empty() {
                config.catalog_url = val.trim().to_string();
            }
        }

        if let Ok(val) = std::env::var("ITSLIVE_CATALOG_CACHE") {
            if !val.trim().is_empty() {
                config.catalog_cache = expand_path(val.trim());
            }
        }

        if let Ok(val) = std::env::var("ITSLIVE_CATALOG_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.catalog_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("CUBE_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.cube_cache_capacity = capacity;
            }
        }

        if let Ok(val) = std::env::var("CUBE_OPEN_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.cube_open_timeout_secs = secs;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.catalog_url.is_empty() {
            return Err("catalog_url must not be empty".to_string());
        }

        if self.catalog_timeout_secs == 0 {
            return Err("catalog_timeout_secs must be > 0".to_string());
        }

        if self.cube_open_timeout_secs == 0 {
            return Err("cube_open_timeout_secs must be > 0".to_string());
        }

        Ok(())
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn cube_open_timeout(&self) -> Duration {
        Duration::from_secs(self.cube_open_timeout_secs)
    }
}

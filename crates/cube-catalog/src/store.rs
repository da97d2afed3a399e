//! Catalog loading: remote fetch with a per-user disk cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use velocity_common::{VelocityError, VelocityResult};

use crate::catalog::Catalog;

/// Published location of the ITS_LIVE cube catalog.
pub const DEFAULT_CATALOG_URL: &str =
    "https://its-live-data.s3.amazonaws.com/datacubes/catalog_v02.json";

/// Per-user cache of the default catalog.
pub const DEFAULT_CATALOG_CACHE: &str = "~/.itslive_catalog.json";

/// Default timeout for the catalog download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Expand `~` and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// Loads catalogs from a URL, using the disk cache for the default catalog.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    default_url: String,
    cache_path: PathBuf,
    client: reqwest::Client,
}

impl CatalogStore {
    /// Create a store.
    ///
    /// Only `default_url` is ever read from or written to `cache_path`.
    pub fn new(
        default_url: impl Into<String>,
        cache_path: impl Into<PathBuf>,
        timeout: Duration,
    ) -> VelocityResult<Self> {
        let default_url = default_url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VelocityError::catalog_unavailable(&default_url, e.to_string()))?;

        Ok(Self {
            default_url,
            cache_path: cache_path.into(),
            client,
        })
    }

    /// Store for the published catalog and the per-user cache file.
    pub fn with_defaults() -> VelocityResult<Self> {
        Self::new(
            DEFAULT_CATALOG_URL,
            expand_path(DEFAULT_CATALOG_CACHE),
            DEFAULT_FETCH_TIMEOUT,
        )
    }

    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Load a catalog, returning it with the URL it was resolved from.
    ///
    /// The cache is used when `url` is the default URL, `reload` is false and
    /// the cache file exists. A successful fetch of the default URL rewrites
    /// the cache. Other URLs are always fetched and never cached.
    pub async fn load(&self, url: &str, reload: bool) -> VelocityResult<(Catalog, String)> {
        let is_default = url == self.default_url;

        if is_default && !reload {
            match self.read_cache().await {
                Ok(Some(catalog)) => return Ok((catalog, self.default_url.clone())),
                Ok(None) => {}
                Err(e) => warn!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "Ignoring unreadable catalog cache"
                ),
            }
        }

        let body = self.fetch(url).await?;
        let catalog = Catalog::from_geojson_str(&body)
            .map_err(|e| VelocityError::catalog_unavailable(url, e.to_string()))?;

        info!(
            url = url,
            features = catalog.len(),
            skipped = catalog.skipped(),
            "Loaded cube catalog"
        );

        if is_default {
            if let Err(e) = self.write_cache(&body).await {
                warn!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "Failed to write catalog cache"
                );
            }
        }

        Ok((catalog, url.to_string()))
    }

    async fn fetch(&self, url: &str) -> VelocityResult<String> {
        debug!(url = url, "Fetching catalog");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VelocityError::catalog_unavailable(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VelocityError::catalog_unavailable(
                url,
                format!("HTTP {}", status),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| VelocityError::catalog_unavailable(url, e.to_string()))
    }

    async fn read_cache(&self) -> VelocityResult<Option<Catalog>> {
        let body = match tokio::fs::read_to_string(&self.cache_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %self.cache_path.display(), "Using cached catalog");
        Catalog::from_geojson_str(&body).map(Some)
    }

    async fn write_cache(&self, body: &str) -> VelocityResult<()> {
        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Readers only ever see a complete file.
        let tmp = self.cache_path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.cache_path).await?;
        debug!(path = %self.cache_path.display(), "Wrote catalog cache");
        Ok(())
    }
}

/// Load a catalog through the default store.
pub async fn load_catalog(url: &str, reload: bool) -> VelocityResult<(Catalog, String)> {
    CatalogStore::with_defaults()?.load(url, reload).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_path(DEFAULT_CATALOG_CACHE);
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with(".itslive_catalog.json"));
    }

    #[test]
    fn test_plain_path_unchanged() {
        assert_eq!(expand_path("/tmp/c.json"), PathBuf::from("/tmp/c.json"));
    }
}

//! A catalog plus an open-cube cache: the entry point for lookups and
//! time-series extraction.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use cube_catalog::{Catalog, CatalogFeature, CatalogStore, DEFAULT_CATALOG_URL};
use velocity_common::QueryPoint;

use crate::cache::CubeCache;
use crate::config::SessionConfig;
use crate::error::{CubeError, Result};
use crate::opener::CubeOpener;
use crate::series::{extract_time_series, merge_default_variables, PointOutcome, TimeSeriesResult};
use crate::zarr::ZarrCubeOpener;

/// Owns the loaded catalog and the cube cache for a sequence of requests.
pub struct CubeSession {
    config: SessionConfig,
    catalog: Arc<Catalog>,
    catalog_source: String,
    cache: CubeCache,
}

impl CubeSession {
    /// Load the configured catalog and read cubes through Zarr.
    pub async fn open(config: SessionConfig) -> Result<Self> {
        let url = config.catalog_url.clone();
        Self::open_with(config, &url, false, Arc::new(ZarrCubeOpener::new())).await
    }

    /// Load the catalog at `url` and read cubes through `opener`.
    pub async fn open_with(
        config: SessionConfig,
        url: &str,
        reload: bool,
        opener: Arc<dyn CubeOpener>,
    ) -> Result<Self> {
        config.validate().map_err(CubeError::Config)?;
        let (catalog, source) = catalog_store(&config)?.load(url, reload).await?;

        let mut session = Self::with_catalog(catalog, opener, config);
        session.catalog_source = source;
        Ok(session)
    }

    /// Session over an already loaded catalog.
    pub fn with_catalog(catalog: Catalog, opener: Arc<dyn CubeOpener>, config: SessionConfig) -> Self {
        let cache = CubeCache::new(opener, config.cube_cache_capacity, config.cube_open_timeout());
        Self {
            catalog_source: config.catalog_url.clone(),
            config,
            catalog: Arc::new(catalog),
            cache,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    /// URL the current catalog was loaded from.
    pub fn catalog_source(&self) -> &str {
        &self.catalog_source
    }

    pub fn cache(&self) -> &CubeCache {
        &self.cache
    }

    /// Fetch the catalog again, bypassing the disk cache, and swap it in.
    ///
    /// `url` defaults to the URL the current catalog came from.
    pub async fn reload_catalog(&mut self, url: Option<&str>) -> Result<()> {
        let url = url.unwrap_or(self.catalog_source.as_str()).to_string();
        let (catalog, source) = catalog_store(&self.config)?.load(&url, true).await?;
        info!(url = %source, features = catalog.len(), "Reloaded catalog");
        self.catalog = Arc::new(catalog);
        self.catalog_source = source;
        Ok(())
    }

    pub fn find(&self, points: &[(f64, f64)]) -> Result<Vec<&CatalogFeature>> {
        Ok(self.catalog.find(points)?)
    }

    pub fn find_by_point(&self, point: &QueryPoint) -> Option<&CatalogFeature> {
        self.catalog.find_by_point(point)
    }

    pub fn find_by_bbox(
        &self,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Vec<&CatalogFeature>> {
        Ok(self.catalog.find_by_bbox(min_lon, min_lat, max_lon, max_lat)?)
    }

    pub fn find_by_polygon(&self, points: &[(f64, f64)]) -> Result<Vec<&CatalogFeature>> {
        Ok(self.catalog.find_by_polygon(points)?)
    }

    /// Time series for every point covered by a cube.
    ///
    /// Points without a cube, or whose cube could not be read, yield no
    /// result; invalid coordinates fail the whole call before any I/O.
    pub async fn get_time_series<S: AsRef<str>>(
        &self,
        points: &[(f64, f64)],
        variables: &[S],
    ) -> Result<Vec<TimeSeriesResult>> {
        Ok(self
            .get_time_series_with_status(points, variables)
            .await?
            .into_iter()
            .filter_map(PointOutcome::into_result)
            .collect())
    }

    /// Like [`get_time_series`](Self::get_time_series) but reports the
    /// outcome of every input point, in input order.
    pub async fn get_time_series_with_status<S: AsRef<str>>(
        &self,
        points: &[(f64, f64)],
        variables: &[S],
    ) -> Result<Vec<PointOutcome>> {
        let points = points
            .iter()
            .map(|&(lon, lat)| QueryPoint::new(lon, lat))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let variables = merge_default_variables(variables);

        let mut outcomes = Vec::with_capacity(points.len());
        for point in points {
            outcomes.push(self.point_outcome(point, &variables).await);
        }
        Ok(outcomes)
    }

    async fn point_outcome(&self, point: QueryPoint, variables: &BTreeSet<String>) -> PointOutcome {
        let Some(feature) = self.catalog.find_by_point(&point) else {
            return PointOutcome::NoCube(point);
        };

        match self.extract(feature, &point, variables).await {
            Ok(result) => PointOutcome::Found(Box::new(result)),
            Err(error) => {
                warn!(
                    lon = point.lon,
                    lat = point.lat,
                    cube = feature.storage_locator(),
                    retryable = error.is_retryable(),
                    error = %error,
                    "Failed to extract time series"
                );
                PointOutcome::Failed { point, error }
            }
        }
    }

    async fn extract(
        &self,
        feature: &CatalogFeature,
        point: &QueryPoint,
        variables: &BTreeSet<String>,
    ) -> Result<TimeSeriesResult> {
        let cube = self.cache.get_or_open(&feature.locator(), feature.epsg()).await?;
        let result = extract_time_series(cube.as_ref(), feature.storage_locator(), point, variables).await?;
        debug!(
            lon = point.lon,
            lat = point.lat,
            steps = result.time_series.len(),
            offset_m = result.returned_point_offset_from_requested_in_projection_meters,
            "Extracted time series"
        );
        Ok(result)
    }
}

/// Only the published catalog shares the per-user cache file; a configured
/// `catalog_url` is just the URL to load.
fn catalog_store(config: &SessionConfig) -> Result<CatalogStore> {
    Ok(CatalogStore::new(
        DEFAULT_CATALOG_URL,
        config.catalog_cache.clone(),
        config.catalog_timeout(),
    )?)
}

//! A single cube entry of the catalog.

use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point, Polygon};
use serde_json::{Map, Value};

use velocity_common::{EpsgCode, ProjectedPoint, QueryPoint, VelocityError, VelocityResult};

use crate::geojson::{GeoJsonGeometry, RawFeature};
use crate::locator::StorageLocator;

/// Property holding the cube's projection code.
pub const PROP_EPSG: &str = "epsg";
/// Property holding the footprint in the cube's projection.
pub const PROP_GEOMETRY_EPSG: &str = "geometry_epsg";
/// Property holding the cube's storage URL.
pub const PROP_ZARR_URL: &str = "zarr_url";

/// One cube of the catalog. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct CatalogFeature {
    footprint_wgs84: MultiPolygon<f64>,
    epsg: EpsgCode,
    footprint_projected: MultiPolygon<f64>,
    storage_locator: String,
    properties: Map<String, Value>,
}

impl CatalogFeature {
    /// Build a feature from already-parsed parts.
    pub fn new(
        footprint_wgs84: MultiPolygon<f64>,
        epsg: EpsgCode,
        footprint_projected: MultiPolygon<f64>,
        storage_locator: impl Into<String>,
    ) -> Self {
        let storage_locator = storage_locator.into();
        let mut properties = Map::new();
        properties.insert(PROP_EPSG.to_string(), Value::from(epsg.code()));
        properties.insert(
            PROP_ZARR_URL.to_string(),
            Value::String(storage_locator.clone()),
        );
        Self {
            footprint_wgs84,
            epsg,
            footprint_projected,
            storage_locator,
            properties,
        }
    }

    /// Parse a GeoJSON feature from the catalog document.
    pub fn from_geojson(value: Value) -> VelocityResult<Self> {
        let raw: RawFeature = serde_json::from_value(value)?;
        let footprint_wgs84 = raw.geometry.to_multi_polygon()?;

        let epsg_value = raw
            .properties
            .get(PROP_EPSG)
            .ok_or_else(|| missing_property(PROP_EPSG))?;
        let epsg: EpsgCode = serde_json::from_value(epsg_value.clone())?;

        let projected_value = raw
            .properties
            .get(PROP_GEOMETRY_EPSG)
            .ok_or_else(|| missing_property(PROP_GEOMETRY_EPSG))?;
        let projected: GeoJsonGeometry = serde_json::from_value(projected_value.clone())?;
        let footprint_projected = projected.to_multi_polygon()?;

        let storage_locator = raw
            .properties
            .get(PROP_ZARR_URL)
            .and_then(Value::as_str)
            .ok_or_else(|| missing_property(PROP_ZARR_URL))?
            .to_string();

        Ok(Self {
            footprint_wgs84,
            epsg,
            footprint_projected,
            storage_locator,
            properties: raw.properties,
        })
    }

    pub fn footprint_wgs84(&self) -> &MultiPolygon<f64> {
        &self.footprint_wgs84
    }

    pub fn epsg(&self) -> EpsgCode {
        self.epsg
    }

    pub fn footprint_projected(&self) -> &MultiPolygon<f64> {
        &self.footprint_projected
    }

    /// The cube URL exactly as published in the catalog (`zarr_url`).
    pub fn storage_locator(&self) -> &str {
        &self.storage_locator
    }

    /// The normalised storage address used to open the cube.
    pub fn locator(&self) -> StorageLocator {
        StorageLocator::from_catalog_url(&self.storage_locator)
    }

    /// All GeoJSON properties, verbatim.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Strict containment of a WGS84 point in the WGS84 footprint.
    pub fn contains_geographic(&self, point: &QueryPoint) -> bool {
        self.footprint_wgs84
            .contains(&Point::new(point.lon, point.lat))
    }

    /// Strict containment of a projected point in the projected footprint.
    ///
    /// Always false when the point is in a different projection.
    pub fn contains_projected(&self, point: &ProjectedPoint) -> bool {
        point.epsg == self.epsg && self.footprint_projected.contains(&Point::new(point.x, point.y))
    }

    /// Whether the WGS84 footprint intersects `polygon` (touching counts).
    pub fn intersects_geographic(&self, polygon: &Polygon<f64>) -> bool {
        self.footprint_wgs84.intersects(polygon)
    }

    /// WGS84 bounds as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn wgs84_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.footprint_wgs84
            .bounding_rect()
            .map(|r| (r.min().x, r.min().y, r.max().x, r.max().y))
    }
}

fn missing_property(name: &str) -> VelocityError {
    VelocityError::InvalidCatalog(format!("feature has no '{}' property", name))
}

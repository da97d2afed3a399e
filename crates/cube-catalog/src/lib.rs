//! Catalog of ITS_LIVE velocity cubes and cube resolution.
//!
//! The catalog is a GeoJSON FeatureCollection in which every feature describes
//! one Zarr cube: its footprint in WGS84, its footprint in the cube's native
//! projection (`properties.geometry_epsg`), the EPSG code of that projection
//! and the cube's `zarr_url`.
//!
//! Point lookups check the WGS84 footprint first and then confirm the match in
//! the cube's own projection, rescanning every feature in its native frame when
//! the two footprints disagree.

pub mod catalog;
pub mod feature;
pub mod geojson;
pub mod locator;
pub mod resolver;
pub mod store;

pub use catalog::Catalog;
pub use feature::CatalogFeature;
pub use locator::StorageLocator;
pub use store::{load_catalog, CatalogStore, DEFAULT_CATALOG_CACHE, DEFAULT_CATALOG_URL};

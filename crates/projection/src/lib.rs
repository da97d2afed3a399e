//! Coordinate reference system transformations.
//!
//! Implements the map projections used by the ITS_LIVE cubes from scratch
//! without external dependencies: WGS84 geographic, polar stereographic
//! (EPSG:3413, EPSG:3031) and UTM (EPSG:326xx, EPSG:327xx).

pub mod ellipsoid;
pub mod error;
pub mod polar;
pub mod transform;
pub mod transverse_mercator;

pub use ellipsoid::Ellipsoid;
pub use error::{ProjectionError, ProjectionResult};
pub use polar::PolarStereographic;
pub use transform::{is_supported, to_geographic, to_projected, Projection};
pub use transverse_mercator::TransverseMercator;

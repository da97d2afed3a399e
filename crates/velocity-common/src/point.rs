//! Query and projected point types.

use serde::{Deserialize, Serialize};

use crate::crs::EpsgCode;
use crate::error::{VelocityError, VelocityResult};

/// A WGS84 query location in degrees.
///
/// Construct with [`QueryPoint::new`], which rejects coordinates outside
/// `lon ∈ [-180, 180]`, `lat ∈ [-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub lon: f64,
    pub lat: f64,
}

impl QueryPoint {
    /// Create a validated query point.
    pub fn new(lon: f64, lat: f64) -> VelocityResult<Self> {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(VelocityError::InvalidCoordinate(format!(
                "longitude {} must be between -180 and 180",
                lon
            )));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(VelocityError::InvalidCoordinate(format!(
                "latitude {} must be between -90 and 90",
                lat
            )));
        }
        Ok(Self { lon, lat })
    }

    /// Round both coordinates to `decimals` places.
    pub fn rounded(&self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        Self {
            lon: (self.lon * factor).round() / factor,
            lat: (self.lat * factor).round() / factor,
        }
    }

    /// Coordinates as a `(lon, lat)` tuple.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }
}

/// A point in the projected coordinates of an EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub epsg: EpsgCode,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64, epsg: EpsgCode) -> Self {
        Self { x, y, epsg }
    }

    /// Planar distance to another point in the same projection.
    pub fn distance_to(&self, other: &ProjectedPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

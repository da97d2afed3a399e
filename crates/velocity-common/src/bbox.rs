//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{VelocityError, VelocityResult};

/// A geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a bounding box from corner coordinates without validation.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Create a bounding box and validate it.
    pub fn try_new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> VelocityResult<Self> {
        let bbox = Self::new(min_lon, min_lat, max_lon, max_lat);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Parse a "minlon,minlat,maxlon,maxlat" string.
    pub fn from_lonlat_string(s: &str) -> VelocityResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(VelocityError::InvalidGeometry(format!(
                "invalid bbox '{}', expected 'minlon,minlat,maxlon,maxlat'",
                s
            )));
        }

        let mut values = [0.0f64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part.parse().map_err(|_| {
                VelocityError::InvalidGeometry(format!("invalid number in bbox: {}", part))
            })?;
        }

        Self::try_new(values[0], values[1], values[2], values[3])
    }

    /// Check coordinate ranges and that min < max on both axes.
    pub fn validate(&self) -> VelocityResult<()> {
        let lons = [self.min_lon, self.max_lon];
        let lats = [self.min_lat, self.max_lat];

        if lons
            .iter()
            .any(|lon| !lon.is_finite() || !(-180.0..=180.0).contains(lon))
        {
            return Err(VelocityError::InvalidCoordinate(format!(
                "bbox longitudes {:?} must be between -180 and 180",
                lons
            )));
        }
        if lats
            .iter()
            .any(|lat| !lat.is_finite() || !(-90.0..=90.0).contains(lat))
        {
            return Err(VelocityError::InvalidCoordinate(format!(
                "bbox latitudes {:?} must be between -90 and 90",
                lats
            )));
        }
        // Reversed corners are rejected rather than normalised.
        if self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(VelocityError::InvalidGeometry(format!(
                "bbox min must be below max on both axes: {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Closed exterior ring of the box as `(lon, lat)` pairs, counter-clockwise.
    pub fn to_ring(&self) -> Vec<(f64, f64)> {
        vec![
            (self.min_lon, self.min_lat),
            (self.max_lon, self.min_lat),
            (self.max_lon, self.max_lat),
            (self.min_lon, self.max_lat),
            (self.min_lon, self.min_lat),
        ]
    }

    /// Check if this bbox overlaps or touches another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

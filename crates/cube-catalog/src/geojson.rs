//! GeoJSON types for the cube catalog document.
//!
//! Only the geometry kinds present in the catalog (Polygon and MultiPolygon)
//! are modelled. Positions are read as arrays of numbers so a trailing
//! elevation value is tolerated and ignored.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use velocity_common::{VelocityError, VelocityResult};

/// A GeoJSON position: `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

/// The catalog document: a FeatureCollection whose features are parsed
/// one at a time so a malformed entry does not reject the whole catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollectionDocument {
    /// Type identifier (must be "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Raw features.
    #[serde(default)]
    pub features: Vec<Value>,
}

/// A GeoJSON Feature as stored in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    pub geometry: GeoJsonGeometry,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Footprint geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    /// Array of linear rings (first is exterior, rest are holes).
    Polygon { coordinates: Vec<Vec<Position>> },

    /// Array of polygons.
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl GeoJsonGeometry {
    /// Convert to a `geo` multi-polygon; a Polygon becomes a single member.
    pub fn to_multi_polygon(&self) -> VelocityResult<MultiPolygon<f64>> {
        match self {
            GeoJsonGeometry::Polygon { coordinates } => {
                Ok(MultiPolygon::new(vec![polygon_from_rings(coordinates)?]))
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                let polygons = coordinates
                    .iter()
                    .map(|rings| polygon_from_rings(rings))
                    .collect::<VelocityResult<Vec<_>>>()?;
                if polygons.is_empty() {
                    return Err(VelocityError::InvalidCatalog(
                        "MultiPolygon has no polygons".to_string(),
                    ));
                }
                Ok(MultiPolygon::new(polygons))
            }
        }
    }
}

fn polygon_from_rings(rings: &[Vec<Position>]) -> VelocityResult<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| line_string(ring));
    let exterior = rings
        .next()
        .ok_or_else(|| VelocityError::InvalidCatalog("Polygon has no rings".to_string()))??;
    let interiors = rings.collect::<VelocityResult<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn line_string(ring: &[Position]) -> VelocityResult<LineString<f64>> {
    if ring.len() < 3 {
        return Err(VelocityError::InvalidCatalog(format!(
            "ring needs at least 3 positions, got {}",
            ring.len()
        )));
    }
    ring.iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            _ => Err(VelocityError::InvalidCatalog(format!(
                "invalid position {:?}",
                position
            ))),
        })
        .collect::<VelocityResult<Vec<_>>>()
        .map(LineString::new)
}

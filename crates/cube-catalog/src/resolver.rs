//! Point, bounding box and polygon to cube resolution.
//!
//! All lookups are full linear scans over the catalog in stored order.

use std::collections::HashMap;

use geo::{LineString, Polygon};
use tracing::{debug, info, warn};

use projection::to_projected;
use velocity_common::{
    BoundingBox, EpsgCode, ProjectedPoint, QueryPoint, VelocityError, VelocityResult,
};

use crate::catalog::Catalog;
use crate::feature::CatalogFeature;

impl Catalog {
    /// Find the cube for a single point.
    ///
    /// The first feature whose WGS84 footprint contains the point is the
    /// candidate. It is returned when its projected footprint also contains
    /// the point reprojected into its EPSG. Otherwise every feature is
    /// checked in its own projection and the first containing one wins. If
    /// none does, nothing is returned; the WGS84-only candidate is never
    /// used on its own.
    pub fn find_by_point(&self, point: &QueryPoint) -> Option<&CatalogFeature> {
        let Some(candidate) = self.iter().find(|f| f.contains_geographic(point)) else {
            info!(
                lon = point.lon,
                lat = point.lat,
                "Point is outside catalog coverage"
            );
            return None;
        };

        let mut reprojections = ReprojectionMemo::new(point);

        if let Some(projected) = reprojections.get(candidate.epsg()) {
            if candidate.contains_projected(&projected) {
                debug!(
                    lon = point.lon,
                    lat = point.lat,
                    cube = candidate.storage_locator(),
                    "Resolved cube"
                );
                return Some(candidate);
            }
        }

        warn!(
            lon = point.lon,
            lat = point.lat,
            epsg = candidate.epsg().code(),
            cube = candidate.storage_locator(),
            "Projected footprint does not contain point, rescanning in native projections"
        );

        for feature in self.iter() {
            let Some(projected) = reprojections.get(feature.epsg()) else {
                continue;
            };
            if feature.contains_projected(&projected) {
                info!(
                    lon = point.lon,
                    lat = point.lat,
                    epsg = feature.epsg().code(),
                    cube = feature.storage_locator(),
                    "Resolved cube in native projection"
                );
                return Some(feature);
            }
        }

        warn!(
            lon = point.lon,
            lat = point.lat,
            "No cube contains point in its native projection"
        );
        None
    }

    /// Find every cube whose WGS84 footprint intersects the box.
    pub fn find_by_bbox(
        &self,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> VelocityResult<Vec<&CatalogFeature>> {
        let bbox = BoundingBox::try_new(min_lon, min_lat, max_lon, max_lat)?;
        let polygon = Polygon::new(LineString::from(bbox.to_ring()), vec![]);
        Ok(self.intersecting(&polygon))
    }

    /// Find every cube whose WGS84 footprint intersects the polygon.
    ///
    /// `points` are `(lon, lat)` vertices; the ring is closed automatically.
    pub fn find_by_polygon(&self, points: &[(f64, f64)]) -> VelocityResult<Vec<&CatalogFeature>> {
        let polygon = query_polygon(points)?;
        Ok(self.intersecting(&polygon))
    }

    /// Dispatch on the number of points: one point is a point lookup, more
    /// are a polygon. No points yield no cubes.
    pub fn find(&self, points: &[(f64, f64)]) -> VelocityResult<Vec<&CatalogFeature>> {
        match points {
            [] => Ok(Vec::new()),
            [(lon, lat)] => {
                let point = QueryPoint::new(*lon, *lat)?;
                Ok(self.find_by_point(&point).into_iter().collect())
            }
            _ => self.find_by_polygon(points),
        }
    }

    fn intersecting(&self, polygon: &Polygon<f64>) -> Vec<&CatalogFeature> {
        let matches: Vec<&CatalogFeature> = self
            .iter()
            .filter(|f| f.intersects_geographic(polygon))
            .collect();
        debug!(matches = matches.len(), "Area lookup");
        matches
    }
}

/// Validate polygon vertices and build the query polygon.
fn query_polygon(points: &[(f64, f64)]) -> VelocityResult<Polygon<f64>> {
    // A closing vertex equal to the first does not count.
    let distinct = match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 && first == last => points.len() - 1,
        _ => points.len(),
    };
    if distinct < 3 {
        return Err(VelocityError::InvalidGeometry(format!(
            "polygon needs at least 3 points, got {}",
            distinct
        )));
    }

    for &(lon, lat) in points {
        QueryPoint::new(lon, lat)?;
    }

    Ok(Polygon::new(LineString::from(points.to_vec()), vec![]))
}

/// Reprojections of one query point, computed at most once per EPSG.
struct ReprojectionMemo<'a> {
    point: &'a QueryPoint,
    by_epsg: HashMap<EpsgCode, Option<ProjectedPoint>>,
}

impl<'a> ReprojectionMemo<'a> {
    fn new(point: &'a QueryPoint) -> Self {
        Self {
            point,
            by_epsg: HashMap::new(),
        }
    }

    /// `None` when the point cannot be projected into `epsg`.
    fn get(&mut self, epsg: EpsgCode) -> Option<ProjectedPoint> {
        let point = self.point;
        *self
            .by_epsg
            .entry(epsg)
            .or_insert_with(|| match to_projected(point, epsg) {
                Ok(projected) => Some(projected),
                Err(e) => {
                    warn!(epsg = epsg.code(), error = %e, "Skipping cubes in unusable projection");
                    None
                }
            })
    }
}

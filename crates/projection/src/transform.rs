//! EPSG-keyed coordinate transformations between WGS84 and cube projections.

use velocity_common::{EpsgCode, ProjectedPoint, QueryPoint, EPSG_WGS84};

use crate::error::{ProjectionError, ProjectionResult};
use crate::polar::{normalize_lon, PolarStereographic};
use crate::transverse_mercator::TransverseMercator;

/// A projection supported by the velocity cubes.
#[derive(Debug, Clone)]
pub enum Projection {
    /// WGS84 longitude/latitude (EPSG:4326), identity transform
    Geographic,
    PolarStereographic(PolarStereographic),
    TransverseMercator(TransverseMercator),
}

impl Projection {
    /// Look up the projection for an EPSG code.
    pub fn from_epsg(epsg: EpsgCode) -> ProjectionResult<Self> {
        match epsg.code() {
            EPSG_WGS84 => Ok(Projection::Geographic),
            3413 => Ok(Projection::PolarStereographic(
                PolarStereographic::epsg_3413(),
            )),
            3031 => Ok(Projection::PolarStereographic(
                PolarStereographic::epsg_3031(),
            )),
            32601..=32660 | 32701..=32760 => Ok(Projection::TransverseMercator(
                TransverseMercator::from_utm_epsg(epsg.code())?,
            )),
            other => Err(ProjectionError::UnsupportedEpsg(other)),
        }
    }

    /// Geographic `(lon, lat)` degrees to projected `(x, y)`.
    pub fn forward(&self, lon: f64, lat: f64) -> ProjectionResult<(f64, f64)> {
        match self {
            Projection::Geographic => Ok((lon, lat)),
            Projection::PolarStereographic(p) => p.forward(lon, lat),
            Projection::TransverseMercator(p) => p.forward(lon, lat),
        }
    }

    /// Projected `(x, y)` to geographic `(lon, lat)` degrees.
    pub fn inverse(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        match self {
            Projection::Geographic => Ok((x, y)),
            Projection::PolarStereographic(p) => p.inverse(x, y),
            Projection::TransverseMercator(p) => p.inverse(x, y),
        }
    }
}

/// Whether `epsg` has a projection implementation.
pub fn is_supported(epsg: EpsgCode) -> bool {
    Projection::from_epsg(epsg).is_ok()
}

/// Reproject a WGS84 point into `epsg`.
pub fn to_projected(point: &QueryPoint, epsg: EpsgCode) -> ProjectionResult<ProjectedPoint> {
    let projection = Projection::from_epsg(epsg)?;
    let (x, y) = projection.forward(point.lon, point.lat)?;
    Ok(ProjectedPoint::new(x, y, epsg))
}

/// Reproject `(x, y)` in `epsg` back to WGS84.
pub fn to_geographic(x: f64, y: f64, epsg: EpsgCode) -> ProjectionResult<QueryPoint> {
    let projection = Projection::from_epsg(epsg)?;
    let (lon, lat) = projection.inverse(x, y)?;
    if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ProjectionError::out_of_domain(x, y, epsg.code()));
    }
    Ok(QueryPoint {
        lon: normalize_lon(lon),
        lat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_epsg() {
        assert!(matches!(
            Projection::from_epsg(EpsgCode(4326)),
            Ok(Projection::Geographic)
        ));
        assert!(matches!(
            Projection::from_epsg(EpsgCode(3413)),
            Ok(Projection::PolarStereographic(_))
        ));
        assert!(matches!(
            Projection::from_epsg(EpsgCode(32718)),
            Ok(Projection::TransverseMercator(_))
        ));
        assert_eq!(
            Projection::from_epsg(EpsgCode(3857)).unwrap_err(),
            ProjectionError::UnsupportedEpsg(3857)
        );
    }

    #[test]
    fn test_geographic_identity() {
        let p = QueryPoint::new(-49.09, 70.0).unwrap();
        let projected = to_projected(&p, EpsgCode::WGS84).unwrap();
        assert_eq!((projected.x, projected.y), (-49.09, 70.0));
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported(EpsgCode(3031)));
        assert!(is_supported(EpsgCode(32760)));
        assert!(!is_supported(EpsgCode(32600)));
        assert!(!is_supported(EpsgCode(3857)));
    }

    #[test]
    fn test_projected_point_carries_epsg() {
        let p = QueryPoint::new(-10.0, -76.1).unwrap();
        let projected = to_projected(&p, EpsgCode(3031)).unwrap();
        assert_eq!(projected.epsg, EpsgCode(3031));
    }
}

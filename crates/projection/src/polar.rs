//! Polar stereographic projection (variant B, standard parallel).
//!
//! Used by the ITS_LIVE cubes over Greenland/Arctic (EPSG:3413, NSIDC Sea Ice
//! Polar Stereographic North) and Antarctica (EPSG:3031).
//!
//! Formulas follow Snyder, "Map Projections: A Working Manual" (USGS 1395),
//! eqs. 21-33 through 21-40 and 7-9 for the inverse latitude. The south polar
//! aspect is obtained by negating latitude, longitude and both axes.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::ellipsoid::Ellipsoid;
use crate::error::{ProjectionError, ProjectionResult};

const MAX_ITERATIONS: usize = 30;
const TOLERANCE: f64 = 1e-14;

/// Polar stereographic projection parameters.
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// EPSG code this projection was built for
    pub epsg: u32,
    /// Latitude of true scale (radians, signed)
    pub lat_ts: f64,
    /// Longitude of origin (radians)
    pub lon0: f64,
    /// True for the south polar aspect
    pub south: bool,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    ellipsoid: Ellipsoid,
    /// a * m_c / t_c, precomputed
    scale: f64,
}

impl PolarStereographic {
    /// Create a polar stereographic projection on WGS84.
    ///
    /// `lat_ts_deg` is the latitude of true scale; its sign selects the pole.
    pub fn new(epsg: u32, lat_ts_deg: f64, lon0_deg: f64) -> Self {
        let ellipsoid = Ellipsoid::WGS84;
        let south = lat_ts_deg < 0.0;
        let lat_ts = lat_ts_deg.to_radians();
        let e = ellipsoid.e();

        // Work in the north aspect; the south aspect flips the latitude sign.
        let phi_c = if south { -lat_ts } else { lat_ts };
        let m_c = m(phi_c, e);
        let t_c = t(phi_c, e);

        Self {
            epsg,
            lat_ts,
            lon0: lon0_deg.to_radians(),
            south,
            false_easting: 0.0,
            false_northing: 0.0,
            ellipsoid,
            scale: ellipsoid.a * m_c / t_c,
        }
    }

    /// NSIDC Sea Ice Polar Stereographic North (EPSG:3413).
    pub fn epsg_3413() -> Self {
        Self::new(3413, 70.0, -45.0)
    }

    /// Antarctic Polar Stereographic (EPSG:3031).
    pub fn epsg_3031() -> Self {
        Self::new(3031, -71.0, 0.0)
    }

    /// Project geographic coordinates (degrees) to map coordinates (meters).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> ProjectionResult<(f64, f64)> {
        let e = self.ellipsoid.e();
        let phi = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lon0;

        let phi_n = if self.south { -phi } else { phi };
        // The opposite pole maps to infinity.
        if !(-90.0..=90.0).contains(&lat_deg) || phi_n + FRAC_PI_2 < 1e-10 {
            return Err(ProjectionError::out_of_domain(lon_deg, lat_deg, self.epsg));
        }

        let rho = self.scale * t(phi_n, e);
        if !rho.is_finite() {
            return Err(ProjectionError::out_of_domain(lon_deg, lat_deg, self.epsg));
        }

        let x = rho * dlon.sin();
        let y = if self.south {
            rho * dlon.cos()
        } else {
            -rho * dlon.cos()
        };

        Ok((x + self.false_easting, y + self.false_northing))
    }

    /// Convert map coordinates (meters) back to geographic (degrees).
    ///
    /// Returns `(lon, lat)` with longitude normalized to [-180, 180].
    pub fn inverse(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        let e = self.ellipsoid.e();
        let x = x - self.false_easting;
        let y = y - self.false_northing;

        let rho = (x * x + y * y).sqrt();
        let t = rho / self.scale;

        let half_e = e / 2.0;
        let mut phi = FRAC_PI_2 - 2.0 * t.atan();
        let mut converged = false;
        for _ in 0..MAX_ITERATIONS {
            let es = e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(half_e)).atan();
            let delta = (next - phi).abs();
            phi = next;
            if delta < TOLERANCE {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(ProjectionError::NoConvergence(self.epsg));
        }

        let (lat, lon) = if self.south {
            (-phi, self.lon0 + x.atan2(y))
        } else {
            (phi, self.lon0 + x.atan2(-y))
        };

        Ok((normalize_lon(lon.to_degrees()), lat.to_degrees()))
    }
}

/// Snyder eq. 15-9.
fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

/// Snyder eq. 14-15.
fn m(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / (1.0 - es * es).sqrt()
}

/// Wrap a longitude in degrees into [-180, 180].
pub(crate) fn normalize_lon(lon: f64) -> f64 {
    let mut lon = lon;
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

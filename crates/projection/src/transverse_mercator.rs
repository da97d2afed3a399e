//! Universal Transverse Mercator projection.
//!
//! Uses the Krüger series in the third flattening n, carried to n^6
//! (Karney, "Transverse Mercator with an accuracy of a few nanometers",
//! J. Geodesy 85, 2011). Accurate to well under a millimetre within the
//! zone and a few thousand kilometres beyond it.

use crate::ellipsoid::Ellipsoid;
use crate::error::{ProjectionError, ProjectionResult};
use crate::polar::normalize_lon;

/// UTM scale factor on the central meridian.
pub const UTM_SCALE: f64 = 0.9996;
/// UTM false easting (meters).
pub const UTM_FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing for southern-hemisphere zones (meters).
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

const MAX_ITERATIONS: usize = 20;
const TOLERANCE: f64 = 1e-12;

/// Transverse Mercator projection for one UTM zone.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// EPSG code this projection was built for
    pub epsg: u32,
    /// UTM zone number (1-60)
    pub zone: u32,
    /// True for the southern-hemisphere variant (327xx)
    pub south: bool,
    /// Central meridian (radians)
    pub lon0: f64,
    pub k0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    e: f64,
    /// Rectifying radius A
    radius: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
}

impl TransverseMercator {
    /// Build the projection for a WGS84 UTM EPSG code (32601-32660, 32701-32760).
    pub fn from_utm_epsg(epsg: u32) -> ProjectionResult<Self> {
        let (zone, south) = match epsg {
            32601..=32660 => (epsg - 32600, false),
            32701..=32760 => (epsg - 32700, true),
            _ => return Err(ProjectionError::UnsupportedEpsg(epsg)),
        };
        Ok(Self::utm(epsg, zone, south))
    }

    fn utm(epsg: u32, zone: u32, south: bool) -> Self {
        let ellipsoid = Ellipsoid::WGS84;
        let n = ellipsoid.n();
        let lon0_deg = zone as f64 * 6.0 - 183.0;

        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let radius = ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
                + 7891.0 * n6 / 37800.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
                - 1983433.0 * n6 / 1935360.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0
                + 167603.0 * n6 / 181440.0,
            49561.0 * n4 / 161280.0 - 179.0 * n5 / 168.0 + 6601661.0 * n6 / 7257600.0,
            34729.0 * n5 / 80640.0 - 3418889.0 * n6 / 1995840.0,
            212378941.0 * n6 / 319334400.0,
        ];

        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
                + 96199.0 * n6 / 604800.0,
            n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0
                - 1118711.0 * n6 / 3870720.0,
            17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
            4397.0 * n4 / 161280.0 - 11.0 * n5 / 504.0 - 830251.0 * n6 / 7257600.0,
            4583.0 * n5 / 161280.0 - 108847.0 * n6 / 3991680.0,
            20648693.0 * n6 / 638668800.0,
        ];

        Self {
            epsg,
            zone,
            south,
            lon0: lon0_deg.to_radians(),
            k0: UTM_SCALE,
            false_easting: UTM_FALSE_EASTING,
            false_northing: if south { UTM_FALSE_NORTHING_SOUTH } else { 0.0 },
            e: ellipsoid.e(),
            radius,
            alpha,
            beta,
        }
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    /// Project geographic coordinates (degrees) to easting/northing (meters).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> ProjectionResult<(f64, f64)> {
        let dlon_deg = normalize_lon(lon_deg - self.central_meridian());
        // The series diverges on the far side of the globe.
        if dlon_deg.abs() >= 90.0 || !(-90.0..=90.0).contains(&lat_deg) {
            return Err(ProjectionError::out_of_domain(lon_deg, lat_deg, self.epsg));
        }

        let phi = lat_deg.to_radians();
        let dlon = dlon_deg.to_radians();

        let tau = phi.tan();
        let tau_prime = conformal_tau(tau, self.e);

        let cos_dlon = dlon.cos();
        let xi_prime = tau_prime.atan2(cos_dlon);
        let eta_prime = (dlon.sin() / (tau_prime * tau_prime + cos_dlon * cos_dlon).sqrt()).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        let x = self.k0 * self.radius * eta + self.false_easting;
        let y = self.k0 * self.radius * xi + self.false_northing;

        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::out_of_domain(lon_deg, lat_deg, self.epsg));
        }
        Ok((x, y))
    }

    /// Convert easting/northing (meters) back to geographic `(lon, lat)` degrees.
    pub fn inverse(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        let eta = (x - self.false_easting) / (self.k0 * self.radius);
        let xi = (y - self.false_northing) / (self.k0 * self.radius);

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_prime -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let sin_xi = xi_prime.sin();
        let cos_xi = xi_prime.cos();

        let tau_prime = sin_xi / (sinh_eta * sinh_eta + cos_xi * cos_xi).sqrt();

        // Newton-Raphson for tau given tau'
        let e2 = self.e * self.e;
        let mut tau = tau_prime;
        let mut converged = false;
        for _ in 0..MAX_ITERATIONS {
            let tau_i_prime = conformal_tau(tau, self.e);
            let delta = (tau_prime - tau_i_prime) / (1.0 + tau_i_prime * tau_i_prime).sqrt()
                * (1.0 + (1.0 - e2) * tau * tau)
                / ((1.0 - e2) * (1.0 + tau * tau).sqrt());
            tau += delta;
            if delta.abs() < TOLERANCE {
                converged = true;
                break;
            }
        }
        if !converged || !tau.is_finite() {
            return Err(ProjectionError::NoConvergence(self.epsg));
        }

        let lat = tau.atan().to_degrees();
        let lon = (self.lon0 + sinh_eta.atan2(cos_xi)).to_degrees();

        Ok((normalize_lon(lon), lat))
    }
}

/// tan of the conformal latitude given tan of the geodetic latitude.
fn conformal_tau(tau: f64, e: f64) -> f64 {
    let sigma = (e * (e * tau / (1.0 + tau * tau).sqrt()).atanh()).sinh();
    tau * (1.0 + sigma * sigma).sqrt() - sigma * (1.0 + tau * tau).sqrt()
}

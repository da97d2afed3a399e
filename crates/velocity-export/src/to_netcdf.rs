//! NetCDF output.
//!
//! Writing NetCDF links against the system libnetcdf, so it is only
//! available with the `netcdf` feature.

use std::path::{Path, PathBuf};

use cube_processor::TimeSeriesResult;
use velocity_common::QueryPoint;

use crate::error::{ExportError, Result};

/// Units of the written `mid_date` variable.
pub const MID_DATE_UNITS: &str = "days since 1970-01-01 00:00:00";

/// Write the series of `result` to `<dir>/<stem>.nc` and return the path.
#[cfg(feature = "netcdf")]
pub fn write_netcdf(point: &QueryPoint, result: &TimeSeriesResult, dir: &Path) -> Result<PathBuf> {
    use cube_processor::SeriesValues;
    use tracing::debug;

    let path = dir.join(format!("{}.nc", crate::format::file_stem(point)));
    let series = &result.time_series;
    let nc = |e: netcdf::Error| ExportError::NetCdf(e.to_string());

    let mut file = netcdf::create(&path).map_err(nc)?;
    file.add_dimension("mid_date", series.len()).map_err(nc)?;

    let days: Vec<f64> = series
        .mid_date
        .iter()
        .map(|t| t.timestamp_millis() as f64 / 86_400_000.0)
        .collect();
    let mut mid_date = file.add_variable::<f64>("mid_date", &["mid_date"]).map_err(nc)?;
    mid_date.put_values(&days, ..).map_err(nc)?;
    mid_date.put_attribute("units", MID_DATE_UNITS).map_err(nc)?;
    mid_date.put_attribute("calendar", "proleptic_gregorian").map_err(nc)?;

    for (name, values) in &series.variables {
        match values {
            SeriesValues::Numeric(data) => {
                let mut var = file.add_variable::<f64>(name, &["mid_date"]).map_err(nc)?;
                var.put_values(data, ..).map_err(nc)?;
                var.put_attribute("_FillValue", f64::NAN).map_err(nc)?;
            }
            SeriesValues::Text(data) => {
                let mut var = file.add_string_variable(name, &["mid_date"]).map_err(nc)?;
                for (i, text) in data.iter().enumerate() {
                    var.put_string(text.as_deref().unwrap_or(""), [i]).map_err(nc)?;
                }
            }
        }
    }

    let returned = &result.returned_point_geographic_coordinates;
    let projected = &result.returned_point_projected_coordinates;
    file.add_attribute("url", series.url.as_str()).map_err(nc)?;
    if let Some(projection) = &series.projection {
        file.add_attribute("projection", projection.as_str()).map_err(nc)?;
    }
    file.add_attribute("requested_lon", point.lon).map_err(nc)?;
    file.add_attribute("requested_lat", point.lat).map_err(nc)?;
    file.add_attribute("returned_lon", returned.lon).map_err(nc)?;
    file.add_attribute("returned_lat", returned.lat).map_err(nc)?;
    file.add_attribute("x", projected.x).map_err(nc)?;
    file.add_attribute("y", projected.y).map_err(nc)?;
    file.add_attribute(
        "offset_from_requested_m",
        result.returned_point_offset_from_requested_in_projection_meters,
    )
    .map_err(nc)?;

    debug!(path = %path.display(), steps = series.len(), "Wrote NetCDF");
    Ok(path)
}

/// Without the `netcdf` feature every call fails with
/// [`ExportError::Unsupported`].
#[cfg(not(feature = "netcdf"))]
pub fn write_netcdf(point: &QueryPoint, result: &TimeSeriesResult, dir: &Path) -> Result<PathBuf> {
    let _ = (point, result, dir);
    Err(netcdf_unavailable())
}

/// True when this build can write NetCDF.
pub fn netcdf_available() -> bool {
    cfg!(feature = "netcdf")
}

pub(crate) fn netcdf_unavailable() -> ExportError {
    ExportError::Unsupported(
        "NetCDF export needs a build with the `netcdf` feature enabled".to_string(),
    )
}

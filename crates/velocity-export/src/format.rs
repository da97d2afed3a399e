//! Output formats and the text formatting shared by them.

use std::fmt;
use std::str::FromStr;

use velocity_common::QueryPoint;

/// Where exported time series go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// One CSV file per point.
    #[default]
    Csv,
    /// One NetCDF file per point.
    NetCdf,
    /// A markdown table per point on stdout.
    Stdout,
}

impl ExportFormat {
    /// True when the format writes files into an output directory.
    pub fn writes_files(&self) -> bool {
        !matches!(self, ExportFormat::Stdout)
    }

    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Csv => Some("csv"),
            ExportFormat::NetCdf => Some("nc"),
            ExportFormat::Stdout => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "netcdf" | "nc" => Ok(ExportFormat::NetCdf),
            "stdout" => Ok(ExportFormat::Stdout),
            other => Err(format!(
                "unknown format '{}', expected csv, netcdf or stdout",
                other
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Csv => "csv",
            ExportFormat::NetCdf => "netcdf",
            ExportFormat::Stdout => "stdout",
        };
        f.write_str(name)
    }
}

/// Format a float the way it appears in file names and tables.
///
/// Whole numbers keep one decimal (`70.0`); everything else uses the
/// shortest representation that round-trips.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// File name stem for a point: `LON<lon>--LAT<lat>`.
pub fn file_stem(point: &QueryPoint) -> String {
    format!(
        "LON{}--LAT{}",
        format_float(point.lon),
        format_float(point.lat)
    )
}

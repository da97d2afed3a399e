//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use cube_catalog::DEFAULT_CATALOG_URL;
use velocity_common::BoundingBox;
use velocity_export::ExportFormat;

/// Variables that can be requested for export.
pub const EXPORT_VARIABLES: [&str; 4] = ["v", "v_error", "vx", "vy"];

#[derive(Parser, Debug)]
#[command(name = "itslive")]
#[command(about = "ITS_LIVE global glacier velocity time series", long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export velocity time series for one or more points
    Export(ExportArgs),

    /// List the cubes covering a point, bounding box or polygon
    Find(FindArgs),
}

/// Catalog selection shared by every command.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// GeoJSON catalog with the ITS_LIVE cube metadata
    #[arg(long = "itslive-catalog", env = "ITSLIVE_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub itslive_catalog: String,

    /// Download the catalog even when a cached copy exists
    #[arg(long)]
    pub reload_catalog: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Input CSV file of comma separated lon,lat coordinates
    #[arg(long, value_name = "CSV", conflicts_with_all = ["lat", "lon"])]
    pub input_coordinates: Option<PathBuf>,

    /// Latitude, e.g. 70.1
    #[arg(long, requires = "lon", allow_hyphen_values = true, value_parser = parse_latitude)]
    pub lat: Option<f64>,

    /// Longitude, e.g. -120.4
    #[arg(long, requires = "lat", allow_hyphen_values = true, value_parser = parse_longitude)]
    pub lon: Option<f64>,

    /// Variables to export on top of the defaults
    #[arg(
        long,
        num_args = 1..,
        default_value = "v",
        ignore_case = true,
        value_parser = EXPORT_VARIABLES
    )]
    pub variables: Vec<String>,

    /// Output directory, defaults to ./itslive-<uuid>
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Export format: csv, netcdf or stdout
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    pub format: ExportFormat,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Latitude of a point
    #[arg(long, requires = "lon", allow_hyphen_values = true, value_parser = parse_latitude)]
    pub lat: Option<f64>,

    /// Longitude of a point
    #[arg(long, requires = "lat", allow_hyphen_values = true, value_parser = parse_longitude)]
    pub lon: Option<f64>,

    /// Bounding box as minlon,minlat,maxlon,maxlat
    #[arg(
        long,
        allow_hyphen_values = true,
        conflicts_with_all = ["lat", "lon", "polygon"],
        value_parser = parse_bbox
    )]
    pub bbox: Option<BoundingBox>,

    /// Polygon as "lon,lat;lon,lat;lon,lat[;...]"
    #[arg(
        long,
        allow_hyphen_values = true,
        conflicts_with_all = ["lat", "lon"],
        value_parser = parse_polygon
    )]
    pub polygon: Option<PolygonArg>,

    /// Print matching features as JSON
    #[arg(long)]
    pub json: bool,
}

/// Polygon vertices given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonArg(pub Vec<(f64, f64)>);

pub fn parse_latitude(s: &str) -> Result<f64, String> {
    let lat: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("not a number: {}", s))?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!(
            "Not a valid latitude value: {}, must be between -90 and 90",
            lat
        ));
    }
    Ok(lat)
}

pub fn parse_longitude(s: &str) -> Result<f64, String> {
    let lon: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("not a number: {}", s))?;
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!(
            "Not a valid longitude value: {}, must be between -180 and 180",
            lon
        ));
    }
    Ok(lon)
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse()
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    BoundingBox::from_lonlat_string(s).map_err(|e| e.to_string())
}

fn parse_polygon(s: &str) -> Result<PolygonArg, String> {
    let vertices = s
        .split(';')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|vertex| {
            let (lon, lat) = vertex
                .split_once(',')
                .ok_or_else(|| format!("expected lon,lat, got '{}'", vertex))?;
            Ok((parse_longitude(lon)?, parse_latitude(lat)?))
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(PolygonArg(vertices))
}

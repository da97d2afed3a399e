//! Command implementations.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::{debug, info};

use cube_catalog::CatalogFeature;
use cube_processor::{CubeSession, SessionConfig, ZarrCubeOpener};
use velocity_export::{export_time_series, ExportOptions};

use crate::cli::{CatalogArgs, ExportArgs, FindArgs};
use crate::input::read_coordinates;

/// Load the catalog selected on the command line.
pub async fn open_session(args: &CatalogArgs) -> Result<CubeSession> {
    let config = SessionConfig::from_env();
    let session = CubeSession::open_with(
        config,
        &args.itslive_catalog,
        args.reload_catalog,
        Arc::new(ZarrCubeOpener::new()),
    )
    .await
    .with_context(|| format!("cannot load catalog {}", args.itslive_catalog))?;

    info!(
        catalog = session.catalog_source(),
        cubes = session.catalog().len(),
        "Catalog ready"
    );
    Ok(session)
}

/// Points from `--input-coordinates` or `--lon/--lat`.
pub fn export_points(args: &ExportArgs) -> Result<Vec<(f64, f64)>> {
    let points = match (&args.input_coordinates, args.lon, args.lat) {
        (Some(path), _, _) => read_coordinates(path)?,
        (None, Some(lon), Some(lat)) => vec![(lon, lat)],
        _ => Vec::new(),
    };
    if points.is_empty() {
        bail!("At least one set of coordinates is needed, see --help");
    }
    Ok(points)
}

pub async fn run_export<W: Write>(session: &CubeSession, args: &ExportArgs, out: &mut W) -> Result<()> {
    let points = export_points(args)?;
    let options = ExportOptions {
        format: args.format,
        variables: args.variables.iter().map(|v| v.to_ascii_lowercase()).collect(),
        outdir: args.outdir.clone(),
        show_progress: !args.quiet,
    };

    let summary = export_time_series(session, &points, &options, out).await?;
    if let Some(dir) = &summary.outdir {
        writeln!(
            out,
            "Exported {} of {} points to {}",
            summary.exported,
            points.len(),
            dir.display()
        )?;
    }
    Ok(())
}

pub fn run_find<W: Write>(session: &CubeSession, args: &FindArgs, out: &mut W) -> Result<()> {
    let features: Vec<&CatalogFeature> = match (&args.bbox, &args.polygon, args.lon, args.lat) {
        (Some(bbox), _, _, _) => {
            session.find_by_bbox(bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat)?
        }
        (None, Some(polygon), _, _) => session.find_by_polygon(&polygon.0)?,
        (None, None, Some(lon), Some(lat)) => session.find(&[(lon, lat)])?,
        _ => bail!("Give a point (--lon/--lat), --bbox or --polygon, see --help"),
    };
    debug!(matches = features.len(), "Find");

    if args.json {
        let items: Vec<_> = features
            .iter()
            .map(|f| {
                json!({
                    "zarr_url": f.storage_locator(),
                    "epsg": f.epsg().code(),
                    "locator": f.locator().to_string(),
                    "bounds": f.wgs84_bounds(),
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&items)?)?;
    } else {
        for feature in &features {
            writeln!(out, "EPSG:{}\t{}", feature.epsg().code(), feature.storage_locator())?;
        }
    }
    Ok(())
}

//! Batch export driver.

use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use cube_processor::{CubeSession, PointOutcome};
use velocity_common::QueryPoint;

use crate::error::Result;
use crate::format::{format_float, ExportFormat};
use crate::frame::ExportFrame;
use crate::to_csv::write_csv;
use crate::to_netcdf::{netcdf_available, netcdf_unavailable, write_netcdf};
use crate::to_table::render_table;

/// Decimal places requested points are rounded to before lookup.
pub const POINT_DECIMALS: i32 = 4;

/// Options for [`export_time_series`].
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Variables requested on top of the defaults.
    pub variables: Vec<String>,
    /// Output directory for file formats; see [`default_outdir`].
    pub outdir: Option<PathBuf>,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            variables: vec!["v".to_string()],
            outdir: None,
            show_progress: true,
        }
    }
}

/// What an export produced.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Directory files were written to, for file formats.
    pub outdir: Option<PathBuf>,
    /// Files written, in input order.
    pub written: Vec<PathBuf>,
    /// Points with data, for every format.
    pub exported: usize,
    /// Rounded points no cube covers.
    pub missing: Vec<QueryPoint>,
    /// Rounded points whose cube could not be read.
    pub failed: Vec<QueryPoint>,
}

/// A fresh `./itslive-<uuid>` directory name.
pub fn default_outdir() -> PathBuf {
    PathBuf::from(format!("./itslive-{}", Uuid::new_v4()))
}

/// Export the time series of every point in `points` (`(lon, lat)` pairs).
///
/// All points are validated before any lookup. Points are processed one at
/// a time in input order; a point without data writes a notice to `out` and
/// the batch continues. Tables for [`ExportFormat::Stdout`] also go to `out`.
#[instrument(skip_all, fields(points = points.len(), format = %options.format))]
pub async fn export_time_series<W: Write>(
    session: &CubeSession,
    points: &[(f64, f64)],
    options: &ExportOptions,
    out: &mut W,
) -> Result<ExportSummary> {
    let points = points
        .iter()
        .map(|&(lon, lat)| QueryPoint::new(lon, lat).map(|p| p.rounded(POINT_DECIMALS)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if options.format == ExportFormat::NetCdf && !netcdf_available() {
        return Err(netcdf_unavailable());
    }

    let mut summary = ExportSummary::default();
    if options.format.writes_files() {
        let dir = options.outdir.clone().unwrap_or_else(default_outdir);
        std::fs::create_dir_all(&dir)?;
        summary.outdir = Some(dir);
    }

    let progress = progress_bar(points.len() as u64, options.show_progress);

    for point in points {
        let outcome = session
            .get_time_series_with_status(&[point.as_tuple()], &options.variables)
            .await?
            .into_iter()
            .next()
            .unwrap_or(PointOutcome::NoCube(point));

        match outcome {
            PointOutcome::Found(result) => {
                match (&options.format, summary.outdir.as_deref()) {
                    (ExportFormat::NetCdf, Some(dir)) => {
                        summary.written.push(write_netcdf(&point, &result, dir)?);
                    }
                    (ExportFormat::Csv, Some(dir)) => {
                        let frame = ExportFrame::from_result(&point, &result);
                        summary.written.push(write_frame(&frame, dir)?);
                    }
                    _ => {
                        let frame = ExportFrame::from_result(&point, &result);
                        let table = render_table(&frame);
                        progress.suspend(|| writeln!(out, "{}", table))?;
                    }
                }
                summary.exported += 1;
            }
            PointOutcome::NoCube(_) => {
                progress.suspend(|| no_data(out, &point))?;
                summary.missing.push(point);
            }
            PointOutcome::Failed { error, .. } => {
                warn!(lon = point.lon, lat = point.lat, error = %error, "Point not exported");
                progress.suspend(|| no_data(out, &point))?;
                summary.failed.push(point);
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!(
        exported = summary.exported,
        missing = summary.missing.len(),
        failed = summary.failed.len(),
        "Export complete"
    );
    Ok(summary)
}

fn write_frame(frame: &ExportFrame, dir: &Path) -> Result<PathBuf> {
    if frame.dropped > 0 {
        info!(
            lon = frame.point.lon,
            lat = frame.point.lat,
            dropped = frame.dropped,
            "Dropped time steps with missing values"
        );
    }
    write_csv(frame, dir)
}

fn no_data<W: Write>(out: &mut W, point: &QueryPoint) -> std::io::Result<()> {
    writeln!(
        out,
        "No data found at lon: {}, lat: {}",
        format_float(point.lon),
        format_float(point.lat)
    )
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len);
    match ProgressStyle::with_template("{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}") {
        Ok(style) => progress.set_style(style.progress_chars("##-")),
        Err(e) => warn!(error = %e, "Invalid progress bar template"),
    }
    progress.set_message(format!("Processing {} coordinates...", len));
    progress
}

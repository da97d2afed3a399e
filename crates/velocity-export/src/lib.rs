//! Export of ITS_LIVE point time series.
//!
//! Each requested point is rounded to four decimals, looked up through a
//! [`CubeSession`](cube_processor::CubeSession) and written as one file per
//! point (CSV or NetCDF) or as a markdown table on stdout. Points without
//! data are reported and skipped.

pub mod error;
pub mod exporter;
pub mod format;
pub mod frame;
pub mod to_csv;
pub mod to_netcdf;
pub mod to_table;

pub use error::{ExportError, Result};
pub use exporter::{default_outdir, export_time_series, ExportOptions, ExportSummary};
pub use format::{file_stem, format_float, ExportFormat};
pub use frame::ExportFrame;
pub use to_csv::write_csv;
pub use to_netcdf::write_netcdf;
pub use to_table::render_table;

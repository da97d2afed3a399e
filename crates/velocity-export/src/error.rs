//! Error types for time-series export.

use cube_processor::CubeError;
use thiserror::Error;
use velocity_common::VelocityError;

/// Errors that can occur while exporting time series.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(String),

    #[error(transparent)]
    Cube(#[from] CubeError),

    /// The requested output is not available in this build.
    #[error("unsupported export: {0}")]
    Unsupported(String),
}

impl From<VelocityError> for ExportError {
    fn from(err: VelocityError) -> Self {
        ExportError::Cube(CubeError::Catalog(err))
    }
}

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

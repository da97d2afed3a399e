//! Error types for cube access and time-series extraction.

use projection::ProjectionError;
use thiserror::Error;
use velocity_common::VelocityError;

/// Errors that can occur while opening or reading a velocity cube.
#[derive(Error, Debug)]
pub enum CubeError {
    /// The cube store could not be opened.
    #[error("failed to open cube {locator}: {message}")]
    OpenFailed { locator: String, message: String },

    /// Reading from an open cube failed.
    #[error("failed to read cube data: {0}")]
    ReadFailed(String),

    /// Opening the cube did not finish in time.
    #[error("timed out after {seconds}s opening cube {locator}")]
    Timeout { locator: String, seconds: u64 },

    /// Cube metadata is missing or malformed.
    #[error("invalid cube metadata: {0}")]
    InvalidMetadata(String),

    /// A required variable is not present in the cube.
    #[error("variable not found in cube: {0}")]
    MissingVariable(String),

    /// Catalog or query validation error.
    #[error(transparent)]
    Catalog(#[from] VelocityError),

    /// Reprojection error.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CubeError {
    /// Create an OpenFailed error.
    pub fn open_failed(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            locator: locator.into(),
            message: message.into(),
        }
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// True for transient I/O failures that may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CubeError::Timeout { .. } | CubeError::OpenFailed { .. } | CubeError::ReadFailed(_)
        )
    }
}

/// Result type alias using CubeError.
pub type Result<T> = std::result::Result<T, CubeError>;

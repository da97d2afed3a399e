//! Error types for catalog lookups and query validation.

use thiserror::Error;

/// Result type alias using VelocityError.
pub type VelocityResult<T> = Result<T, VelocityError>;

/// Primary error type for catalog and query operations.
#[derive(Debug, Error)]
pub enum VelocityError {
    // === Catalog Errors ===
    #[error("Catalog unavailable from {url}: {message}")]
    CatalogUnavailable { url: String, message: String },

    #[error("Invalid catalog document: {0}")]
    InvalidCatalog(String),

    // === Query Input Errors ===
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid EPSG code: {0}")]
    InvalidEpsg(String),

    // === Processing Errors ===
    #[error("Projection error: {0}")]
    Projection(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl VelocityError {
    /// Create a CatalogUnavailable error.
    pub fn catalog_unavailable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            url: url.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by caller input, detected before any I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            VelocityError::InvalidGeometry(_)
                | VelocityError::InvalidCoordinate(_)
                | VelocityError::InvalidEpsg(_)
        )
    }
}

impl From<std::io::Error> for VelocityError {
    fn from(err: std::io::Error) -> Self {
        VelocityError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VelocityError {
    fn from(err: serde_json::Error) -> Self {
        VelocityError::InvalidCatalog(format!("JSON error: {}", err))
    }
}

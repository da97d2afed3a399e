//! Projection error types.

use thiserror::Error;
use velocity_common::VelocityError;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Unsupported EPSG code: {0}")]
    UnsupportedEpsg(u32),

    #[error("Point ({x}, {y}) is outside the domain of EPSG:{epsg}")]
    OutOfDomain { x: f64, y: f64, epsg: u32 },

    #[error("Inverse projection did not converge for EPSG:{0}")]
    NoConvergence(u32),
}

impl ProjectionError {
    pub fn out_of_domain(x: f64, y: f64, epsg: u32) -> Self {
        Self::OutOfDomain { x, y, epsg }
    }
}

impl From<ProjectionError> for VelocityError {
    fn from(err: ProjectionError) -> Self {
        VelocityError::Projection(err.to_string())
    }
}

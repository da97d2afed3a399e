//! Common types shared across the ITS_LIVE velocity cube crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod point;

pub use bbox::BoundingBox;
pub use crs::{EpsgCode, EPSG_WGS84};
pub use error::{VelocityError, VelocityResult};
pub use point::{ProjectedPoint, QueryPoint};

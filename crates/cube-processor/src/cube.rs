//! The open-cube abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use velocity_common::EpsgCode;

use crate::error::Result;
use crate::series::SeriesValues;

/// An open velocity cube: variables labelled by projected `x`/`y`
/// coordinates and a `mid_date` time axis.
///
/// Implementations are shared between callers through the cube cache and
/// must be safe to read concurrently.
#[async_trait]
pub trait VelocityCube: Send + Sync {
    /// Normalised storage locator the cube was opened from.
    fn locator(&self) -> &str;

    /// Projection of the `x`/`y` axes.
    fn epsg(&self) -> EpsgCode;

    /// Projected easting of each column.
    fn x(&self) -> &[f64];

    /// Projected northing of each row.
    fn y(&self) -> &[f64];

    /// Time axis.
    fn mid_date(&self) -> &[DateTime<Utc>];

    /// Cube-level attributes.
    fn attrs(&self) -> &Map<String, Value>;

    /// Read one variable along the time axis at cell `(row, col)`.
    ///
    /// Returns [`CubeError::MissingVariable`](crate::CubeError::MissingVariable)
    /// when the cube has no such variable.
    async fn read_series(&self, name: &str, row: usize, col: usize) -> Result<SeriesValues>;
}

/// Index of the axis value closest to `value`.
///
/// Ties resolve to the smallest index; NaN entries never match.
pub fn nearest_index(axis: &[f64], value: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &coord) in axis.iter().enumerate() {
        let distance = (coord - value).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

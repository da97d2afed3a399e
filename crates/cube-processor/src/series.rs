//! Point time series and their extraction from an open cube.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use projection::{to_geographic, to_projected};
use velocity_common::{ProjectedPoint, QueryPoint};

use crate::cube::{nearest_index, VelocityCube};
use crate::error::{CubeError, Result};

/// Variables always extracted in addition to the requested ones.
pub const DEFAULT_VARIABLES: [&str; 9] = [
    "v",
    "v_error",
    "vx",
    "vx_error",
    "vy",
    "vy_error",
    "date_dt",
    "satellite_img1",
    "mission_img1",
];

/// Variables a cube must provide for a point to yield a result.
pub const CORE_VARIABLES: [&str; 3] = ["v", "vx", "vy"];

/// Union of the requested variables and [`DEFAULT_VARIABLES`].
pub fn merge_default_variables<S: AsRef<str>>(requested: &[S]) -> BTreeSet<String> {
    requested
        .iter()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .chain(DEFAULT_VARIABLES.iter().map(|v| v.to_string()))
        .collect()
}

/// Values of one variable along the time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SeriesValues {
    /// Decoded numeric values; missing entries are NaN.
    Numeric(Vec<f64>),
    /// Labels such as mission or satellite names.
    Text(Vec<Option<String>>),
}

impl SeriesValues {
    pub fn len(&self) -> usize {
        match self {
            SeriesValues::Numeric(values) => values.len(),
            SeriesValues::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when entry `i` is absent.
    pub fn is_missing(&self, i: usize) -> bool {
        match self {
            SeriesValues::Numeric(values) => values.get(i).map_or(true, |v| v.is_nan()),
            SeriesValues::Text(values) => values
                .get(i)
                .map_or(true, |v| v.as_deref().map_or(true, str::is_empty)),
        }
    }

    /// Entry `i` formatted for tabular output; `None` when missing.
    pub fn display_at(&self, i: usize) -> Option<String> {
        if self.is_missing(i) {
            return None;
        }
        match self {
            SeriesValues::Numeric(values) => values.get(i).map(|v| v.to_string()),
            SeriesValues::Text(values) => values.get(i).cloned().flatten(),
        }
    }
}

/// The time series of one cube cell.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    /// Catalog URL of the cube.
    pub url: String,
    /// The cube's `projection` attribute.
    pub projection: Option<String>,
    /// Time axis shared by every variable.
    pub mid_date: Vec<DateTime<Utc>>,
    /// Variable name to values, one per `mid_date` entry.
    pub variables: BTreeMap<String, SeriesValues>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.mid_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mid_date.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SeriesValues> {
        self.variables.get(name)
    }

    /// Numeric values of `name`, if present and numeric.
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        match self.variables.get(name) {
            Some(SeriesValues::Numeric(values)) => Some(values),
            _ => None,
        }
    }
}

/// Time series for one requested point.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesResult {
    pub requested_point_geographic_coordinates: QueryPoint,
    pub returned_point_geographic_coordinates: QueryPoint,
    pub returned_point_projected_coordinates: ProjectedPoint,
    pub returned_point_offset_from_requested_in_projection_meters: f64,
    pub time_series: TimeSeries,
    /// Catalog URL of the cube the series came from.
    pub storage_locator: String,
}

/// Per-point status of a batch extraction.
#[derive(Debug)]
pub enum PointOutcome {
    Found(Box<TimeSeriesResult>),
    /// No cube covers the point.
    NoCube(QueryPoint),
    /// A cube covers the point but could not be read.
    Failed { point: QueryPoint, error: CubeError },
}

impl PointOutcome {
    pub fn point(&self) -> QueryPoint {
        match self {
            PointOutcome::Found(result) => result.requested_point_geographic_coordinates,
            PointOutcome::NoCube(point) => *point,
            PointOutcome::Failed { point, .. } => *point,
        }
    }

    pub fn into_result(self) -> Option<TimeSeriesResult> {
        match self {
            PointOutcome::Found(result) => Some(*result),
            _ => None,
        }
    }
}

/// Extract the series of the cell nearest to `point`.
///
/// The point is reprojected into the cube's EPSG and the nearest `x` and `y`
/// coordinates are selected independently. Optional variables the cube lacks
/// are skipped; a missing core variable fails the point.
pub async fn extract_time_series(
    cube: &dyn VelocityCube,
    storage_locator: &str,
    point: &QueryPoint,
    variables: &BTreeSet<String>,
) -> Result<TimeSeriesResult> {
    let epsg = cube.epsg();
    let requested = to_projected(point, epsg)?;

    let col = nearest_index(cube.x(), requested.x)
        .ok_or_else(|| CubeError::invalid_metadata("cube has an empty x axis"))?;
    let row = nearest_index(cube.y(), requested.y)
        .ok_or_else(|| CubeError::invalid_metadata("cube has an empty y axis"))?;

    let returned = ProjectedPoint::new(cube.x()[col], cube.y()[row], epsg);
    let returned_geographic = to_geographic(returned.x, returned.y, epsg)?;
    let offset = requested.distance_to(&returned);

    debug!(
        cube = storage_locator,
        row = row,
        col = col,
        offset_m = offset,
        "Selected nearest cell"
    );

    let n_time = cube.mid_date().len();
    let mut series = BTreeMap::new();
    for name in variables {
        let core = CORE_VARIABLES.contains(&name.as_str());
        match cube.read_series(name, row, col).await {
            Ok(values) if values.len() == n_time => {
                series.insert(name.clone(), values);
            }
            Ok(values) => {
                return Err(CubeError::invalid_metadata(format!(
                    "variable {} has {} entries, expected {}",
                    name,
                    values.len(),
                    n_time
                )));
            }
            Err(e @ (CubeError::MissingVariable(_) | CubeError::InvalidMetadata(_))) if !core => {
                warn!(cube = storage_locator, variable = %name, error = %e, "Skipping variable");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(TimeSeriesResult {
        requested_point_geographic_coordinates: *point,
        returned_point_geographic_coordinates: returned_geographic,
        returned_point_projected_coordinates: returned,
        returned_point_offset_from_requested_in_projection_meters: offset,
        time_series: TimeSeries {
            url: storage_locator.to_string(),
            projection: projection_attr(cube),
            mid_date: cube.mid_date().to_vec(),
            variables: series,
        },
        storage_locator: storage_locator.to_string(),
    })
}

fn projection_attr(cube: &dyn VelocityCube) -> Option<String> {
    match cube.attrs().get("projection") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_defaults_superset() {
        let merged = merge_default_variables(&["v", "acquisition_date_img1"]);
        for name in DEFAULT_VARIABLES {
            assert!(merged.contains(name));
        }
        assert!(merged.contains("acquisition_date_img1"));
        assert_eq!(merged.len(), 10);
    }

    #[test]
    fn test_merge_defaults_empty_request() {
        let merged = merge_default_variables::<&str>(&[]);
        assert_eq!(merged.len(), DEFAULT_VARIABLES.len());
        let again = merge_default_variables(&[" ", "v"]);
        assert_eq!(merged, again);
    }

    #[test]
    fn test_series_missing_entries() {
        let numeric = SeriesValues::Numeric(vec![1.5, f64::NAN]);
        assert!(!numeric.is_missing(0));
        assert!(numeric.is_missing(1));
        assert!(numeric.is_missing(2));
        assert_eq!(numeric.display_at(0).as_deref(), Some("1.5"));
        assert_eq!(numeric.display_at(1), None);

        let text = SeriesValues::Text(vec![Some("L8".into()), Some(String::new()), None]);
        assert_eq!(text.display_at(0).as_deref(), Some("L8"));
        assert!(text.is_missing(1));
        assert!(text.is_missing(2));
    }
}

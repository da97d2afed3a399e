//! Tabular view of one point's time series.

use chrono::{DateTime, Utc};

use cube_processor::{SeriesValues, TimeSeriesResult};
use velocity_common::QueryPoint;

use crate::format::{file_stem, format_float};

/// Name of the leading index column.
pub const INDEX_COLUMN: &str = "mid_date";

/// Output columns backed by a cube variable, in output order.
pub const VARIABLE_COLUMNS: [(&str, &str); 9] = [
    ("v [m/yr]", "v"),
    ("v_error [m/yr]", "v_error"),
    ("vx [m/yr]", "vx"),
    ("vx_error [m/yr]", "vx_error"),
    ("vy [m/yr]", "vy"),
    ("vy_error [m/yr]", "vy_error"),
    ("date_dt [days]", "date_dt"),
    ("mission", "mission_img1"),
    ("satellite", "satellite_img1"),
];

/// Rows of one point's series, ready to be written.
///
/// `lon` and `lat` hold the requested point, not the grid cell. A time step
/// is dropped when any variable the cube provided is missing at that step;
/// variables the cube lacks altogether leave an empty column instead.
#[derive(Debug, Clone)]
pub struct ExportFrame {
    pub point: QueryPoint,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Time steps removed for missing values.
    pub dropped: usize,
}

impl ExportFrame {
    pub fn from_result(point: &QueryPoint, result: &TimeSeriesResult) -> Self {
        let series = &result.time_series;
        let epsg = series.projection.clone().unwrap_or_default();
        let lon = format_float(point.lon);
        let lat = format_float(point.lat);

        let mut header = vec![INDEX_COLUMN.to_string(), "lon".to_string(), "lat".to_string()];
        header.extend(VARIABLE_COLUMNS.iter().map(|(column, _)| column.to_string()));
        header.push("epsg".to_string());

        let mut rows = Vec::with_capacity(series.len());
        let mut dropped = 0;

        'steps: for (i, mid_date) in series.mid_date.iter().enumerate() {
            let mut row = Vec::with_capacity(header.len());
            row.push(format_timestamp(mid_date));
            row.push(lon.clone());
            row.push(lat.clone());

            for (_, variable) in VARIABLE_COLUMNS {
                match series.get(variable) {
                    Some(values) => match cell(variable, values, i) {
                        Some(text) => row.push(text),
                        None => {
                            dropped += 1;
                            continue 'steps;
                        }
                    },
                    None => row.push(String::new()),
                }
            }

            row.push(epsg.clone());
            rows.push(row);
        }

        Self {
            point: *point,
            header,
            rows,
            dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// File name stem for this point.
    pub fn file_stem(&self) -> String {
        file_stem(&self.point)
    }

    /// Values of one column, by header name.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.header.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }
}

/// Index timestamps print without a fractional part when it is zero.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

fn cell(variable: &str, values: &SeriesValues, i: usize) -> Option<String> {
    if values.is_missing(i) {
        return None;
    }
    match values {
        // Whole days only.
        SeriesValues::Numeric(v) if variable == "date_dt" => {
            v.get(i).map(|days| format!("{}", days.floor() as i64))
        }
        SeriesValues::Numeric(v) => v.get(i).map(|x| format_float(*x)),
        SeriesValues::Text(v) => v.get(i).cloned().flatten(),
    }
}

//! Coordinate input files.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::{parse_latitude, parse_longitude};

/// Read `lon,lat` pairs from the first two columns of a headerless CSV file.
pub fn read_coordinates(path: &Path) -> Result<Vec<(f64, f64)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{}: invalid CSV", path.display()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = i + 1;
        let (Some(lon), Some(lat)) = (record.get(0), record.get(1)) else {
            bail!(
                "{} line {}: not a valid CSV file, the format is lon,lat",
                path.display(),
                line
            );
        };
        let lon = parse_longitude(lon)
            .map_err(|e| anyhow::anyhow!("{} line {}: {}", path.display(), line, e))?;
        let lat = parse_latitude(lat)
            .map_err(|e| anyhow::anyhow!("{} line {}: {}", path.display(), line, e))?;
        points.push((lon, lat));
    }
    Ok(points)
}

//! CSV output.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::frame::ExportFrame;

/// Write `frame` to `<dir>/<stem>.csv` and return the path.
pub fn write_csv(frame: &ExportFrame, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{}.csv", frame.file_stem()));

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(&frame.header)?;
    for row in &frame.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    debug!(
        path = %path.display(),
        rows = frame.len(),
        dropped = frame.dropped,
        "Wrote CSV"
    );
    Ok(path)
}

//! Export of in-memory cubes through a session.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use cube_catalog::{Catalog, StorageLocator};
use cube_processor::{CubeSession, MemoryCube, MemoryCubeOpener, SessionConfig};
use projection::{to_geographic, to_projected};
use serde_json::Value;
use test_utils::{
    densified_square_ring, feature_collection, feature_json, points, regular_axis, square_ring,
    temp_test_dir,
};
use velocity_common::{EpsgCode, QueryPoint};
use velocity_export::{
    export_time_series, ExportError, ExportFormat, ExportFrame, ExportOptions,
};

const SPACING: f64 = 120.0;
const CELLS: usize = 5;
const STEPS: usize = 5;
const GAP_STEP: usize = 2;

const CUBE_URL: &str =
    "http://its-live-data.s3.amazonaws.com/datacubes/v02/N60W040/ITS_LIVE_vel_EPSG3413_G0120_export.zarr";

fn dates() -> Vec<DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2018, 3, 1, 0, 0, 0).unwrap();
    (0..STEPS).map(|i| start + Duration::days(16 * i as i64)).collect()
}

/// Every cell of step `t` holds `base + t`; `v` has a gap at `GAP_STEP`.
fn grid(base: f64, gap: bool) -> Vec<f64> {
    (0..STEPS)
        .flat_map(|t| {
            let value = if gap && t == GAP_STEP { f64::NAN } else { base + t as f64 };
            std::iter::repeat(value).take(CELLS * CELLS)
        })
        .collect()
}

fn fixture(point: (f64, f64)) -> (Value, MemoryCube) {
    let epsg = EpsgCode(3413);
    let centre = to_projected(&QueryPoint::new(point.0, point.1).unwrap(), epsg).unwrap();
    let (cx, cy) = (
        (centre.x / SPACING).round() * SPACING,
        (centre.y / SPACING).round() * SPACING,
    );
    let half = SPACING * (CELLS / 2) as f64;

    let wgs84: Vec<(f64, f64)> = densified_square_ring(cx, cy, 50_000.0, 16)
        .into_iter()
        .map(|(px, py)| {
            let p = to_geographic(px, py, epsg).unwrap();
            (p.lon, p.lat)
        })
        .collect();
    let feature = feature_json(&wgs84, 3413, &square_ring(cx, cy, 50_000.0), CUBE_URL);

    let locator = StorageLocator::from_catalog_url(CUBE_URL).to_string();
    let cube = MemoryCube::new(
        locator,
        epsg,
        regular_axis(cx - half, SPACING, CELLS),
        regular_axis(cy + half, -SPACING, CELLS),
        dates(),
    )
    .with_grid("v", grid(500.0, true))
    .unwrap()
    .with_grid("v_error", grid(20.0, false))
    .unwrap()
    .with_grid("vx", grid(400.0, false))
    .unwrap()
    .with_grid("vx_error", grid(15.0, false))
    .unwrap()
    .with_grid("vy", grid(-300.0, false))
    .unwrap()
    .with_grid("vy_error", grid(10.0, false))
    .unwrap()
    .with_grid("date_dt", vec![16.5; STEPS * CELLS * CELLS])
    .unwrap()
    .with_text(
        "mission_img1",
        (0..STEPS).map(|_| Some("L8".to_string())).collect(),
    )
    .unwrap();

    (feature, cube)
}

fn session() -> CubeSession {
    let (feature, cube) = fixture(points::JAKOBSHAVN);
    let catalog = Catalog::from_feature_collection(feature_collection(vec![feature])).unwrap();
    let opener = Arc::new(MemoryCubeOpener::new().with_cube(cube));
    CubeSession::with_catalog(catalog, opener, SessionConfig::default())
}

/// A session whose catalog lists the cube but whose opener cannot open it.
fn broken_session() -> CubeSession {
    let (feature, _) = fixture(points::JAKOBSHAVN);
    let catalog = Catalog::from_feature_collection(feature_collection(vec![feature])).unwrap();
    CubeSession::with_catalog(catalog, Arc::new(MemoryCubeOpener::new()), SessionConfig::default())
}

fn options(format: ExportFormat, outdir: Option<std::path::PathBuf>) -> ExportOptions {
    ExportOptions {
        format,
        variables: vec!["v".to_string()],
        outdir,
        show_progress: false,
    }
}

#[tokio::test]
async fn test_csv_export() {
    let session = session();
    let dir = temp_test_dir();
    let mut out = Vec::new();

    let summary = export_time_series(
        &session,
        &[points::JAKOBSHAVN],
        &options(ExportFormat::Csv, Some(dir.path().to_path_buf())),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(summary.exported, 1);
    assert_eq!(summary.written.len(), 1);
    let path = &summary.written[0];
    assert_eq!(path, &dir.path().join("LON-49.09--LAT70.0.csv"));

    let mut reader = csv::Reader::from_path(path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        header,
        [
            "mid_date",
            "lon",
            "lat",
            "v [m/yr]",
            "v_error [m/yr]",
            "vx [m/yr]",
            "vx_error [m/yr]",
            "vy [m/yr]",
            "vy_error [m/yr]",
            "date_dt [days]",
            "mission",
            "satellite",
            "epsg",
        ]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), STEPS - 1);

    let first = &rows[0];
    assert_eq!(&first[0], "2018-03-01 00:00:00");
    assert_eq!(&first[1], "-49.09");
    assert_eq!(&first[2], "70.0");
    assert_eq!(&first[3], "500.0");
    assert_eq!(&first[7], "-300.0");
    assert_eq!(&first[9], "16");
    assert_eq!(&first[10], "L8");
    assert_eq!(&first[11], "");
    assert_eq!(&first[12], "3413");

    // The step with a gap in v is dropped.
    let v: Vec<&str> = rows.iter().map(|r| &r[3]).collect();
    assert_eq!(v, ["500.0", "501.0", "503.0", "504.0"]);
}

#[tokio::test]
async fn test_points_rounded_before_lookup() {
    let session = session();
    let dir = temp_test_dir();
    let mut out = Vec::new();

    let summary = export_time_series(
        &session,
        &[(-49.090_04, 70.000_02)],
        &options(ExportFormat::Csv, Some(dir.path().to_path_buf())),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(summary.written, vec![dir.path().join("LON-49.09--LAT70.0.csv")]);
}

#[tokio::test]
async fn test_missing_point_reported_and_batch_continues() {
    let session = session();
    let dir = temp_test_dir();
    let mut out = Vec::new();

    let summary = export_time_series(
        &session,
        &[points::NULL_ISLAND, points::JAKOBSHAVN],
        &options(ExportFormat::Csv, Some(dir.path().to_path_buf())),
        &mut out,
    )
    .await
    .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert_eq!(out, "No data found at lon: 0.0, lat: 0.0\n");
    assert_eq!(summary.missing, vec![QueryPoint::new(0.0, 0.0).unwrap()]);
    assert_eq!(summary.exported, 1);
    assert!(!dir.path().join("LON0.0--LAT0.0.csv").exists());
}

#[tokio::test]
async fn test_unreadable_cube_reported_as_no_data() {
    let session = broken_session();
    let dir = temp_test_dir();
    let mut out = Vec::new();

    let summary = export_time_series(
        &session,
        &[points::JAKOBSHAVN],
        &options(ExportFormat::Csv, Some(dir.path().to_path_buf())),
        &mut out,
    )
    .await
    .unwrap();

    assert!(String::from_utf8(out).unwrap().starts_with("No data found at lon: -49.09"));
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.written.is_empty());
}

#[tokio::test]
async fn test_stdout_table() {
    let session = session();
    let mut out = Vec::new();

    let summary = export_time_series(
        &session,
        &[points::JAKOBSHAVN],
        &options(ExportFormat::Stdout, None),
        &mut out,
    )
    .await
    .unwrap();

    assert!(summary.outdir.is_none());
    assert!(summary.written.is_empty());
    assert_eq!(summary.exported, 1);

    let table = String::from_utf8(out).unwrap();
    assert!(table.contains("mid_date"));
    assert!(table.contains("v [m/yr]"));
    assert!(table.contains("2018-03-17 00:00:00"));
    assert!(!table.contains("2018-04-02"), "gap step should be dropped");
    assert!(table.lines().all(|line| line.is_empty() || line.starts_with('|')));
}

#[tokio::test]
async fn test_invalid_point_fails_before_output() {
    let session = session();
    let dir = temp_test_dir();
    let outdir = dir.path().join("never-created");
    let mut out = Vec::new();

    let err = export_time_series(
        &session,
        &[points::JAKOBSHAVN, (-49.0, 95.0)],
        &options(ExportFormat::Csv, Some(outdir.clone())),
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ExportError::Cube(_)));
    assert!(!outdir.exists());
    assert!(out.is_empty());
}

#[cfg(not(feature = "netcdf"))]
#[tokio::test]
async fn test_netcdf_unsupported_without_feature() {
    let session = session();
    let dir = temp_test_dir();
    let mut out = Vec::new();

    let err = export_time_series(
        &session,
        &[points::JAKOBSHAVN],
        &options(ExportFormat::NetCdf, Some(dir.path().join("nc"))),
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ExportError::Unsupported(_)));
    assert!(!dir.path().join("nc").exists());
}

#[cfg(feature = "netcdf")]
#[tokio::test]
async fn test_netcdf_export() {
    let session = session();
    let dir = temp_test_dir();
    let mut out = Vec::new();

    let summary = export_time_series(
        &session,
        &[points::JAKOBSHAVN],
        &options(ExportFormat::NetCdf, Some(dir.path().to_path_buf())),
        &mut out,
    )
    .await
    .unwrap();

    let path = dir.path().join("LON-49.09--LAT70.0.nc");
    assert_eq!(summary.written, vec![path.clone()]);

    let file = netcdf::open(&path).unwrap();
    let v = file.variable("v").unwrap();
    let values: Vec<f64> = v.get_values(..).unwrap();
    assert_eq!(values.len(), STEPS);
    assert!(values[GAP_STEP].is_nan());
    assert_eq!(values[0], 500.0);
}

#[tokio::test]
async fn test_frame_from_session_result() {
    let session = session();
    let results = session
        .get_time_series(&[points::JAKOBSHAVN], &["v"])
        .await
        .unwrap();
    let point = QueryPoint::new(points::JAKOBSHAVN.0, points::JAKOBSHAVN.1).unwrap();

    let frame = ExportFrame::from_result(&point, &results[0]);
    assert_eq!(frame.len(), STEPS - 1);
    assert_eq!(frame.dropped, 1);
    assert_eq!(frame.file_stem(), "LON-49.09--LAT70.0");
    assert_eq!(
        frame.column("vx [m/yr]").unwrap(),
        ["400.0", "401.0", "403.0", "404.0"]
    );
    assert!(frame.column("satellite").unwrap().iter().all(|s| s.is_empty()));
}

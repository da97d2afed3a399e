//! Integration test: write a small cube as Zarr and read it back through
//! the Zarr opener and a session.

use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use cube_catalog::{Catalog, StorageLocator};
use cube_processor::{
    CubeError, CubeOpener, CubeSession, SeriesValues, SessionConfig, VelocityCube, ZarrCubeOpener,
};
use projection::{to_geographic, to_projected};
use serde_json::json;
use test_utils::{
    create_test_cube, densified_square_ring, feature_collection, feature_json, mid_date_offsets,
    points, regular_axis, square_ring, temp_test_dir,
};
use velocity_common::{EpsgCode, QueryPoint};
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

const NT: usize = 3;
const NY: usize = 4;
const NX: usize = 5;
const VX_FILL: i16 = -32767;

struct CubeAxes {
    x: Vec<f64>,
    y: Vec<f64>,
    days: Vec<f64>,
}

fn attrs(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Write a cube with `v` (f32), `vx` (scaled i16 with fill) and `vy`
/// (f64, no declared dimensions) over the given axes.
fn write_cube(path: &Path, axes: &CubeAxes) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(FilesystemStore::new(path)?);

    GroupBuilder::new()
        .attributes(attrs(json!({"projection": "3413", "GDAL_AREA_OR_POINT": "Area"})))
        .build(store.clone(), "/")?
        .store_metadata()?;

    let coordinate = |name: &str, values: &[f64], extra: serde_json::Value| -> Result<(), Box<dyn std::error::Error>> {
        let mut a = attrs(extra);
        a.insert("_ARRAY_DIMENSIONS".to_string(), json!([name]));
        let array = ArrayBuilder::new(
            vec![values.len() as u64],
            DataType::Float64,
            vec![values.len() as u64].try_into()?,
            FillValue::from(f64::NAN),
        )
        .attributes(a)
        .build(store.clone(), &format!("/{}", name))?;
        array.store_metadata()?;
        let subset = ArraySubset::new_with_shape(vec![values.len() as u64]);
        array.store_array_subset_elements(&subset, values)?;
        Ok(())
    };
    coordinate("x", &axes.x, json!({}))?;
    coordinate("y", &axes.y, json!({}))?;
    coordinate("mid_date", &axes.days, json!({"units": "days since 1970-01-01"}))?;

    let shape = vec![NT as u64, NY as u64, NX as u64];
    let chunks = vec![NT as u64, 2, 2];
    let full = ArraySubset::new_with_shape(shape.clone());

    let v = ArrayBuilder::new(
        shape.clone(),
        DataType::Float32,
        chunks.clone().try_into()?,
        FillValue::from(f32::NAN),
    )
    .attributes(attrs(json!({"_ARRAY_DIMENSIONS": ["mid_date", "y", "x"], "units": "meter/year"})))
    .build(store.clone(), "/v")?;
    v.store_metadata()?;
    v.store_array_subset_elements(&full, &create_test_cube(NT, NY, NX))?;

    // vx = raw * 0.5, with the first time step missing everywhere.
    let raw_vx: Vec<i16> = (0..NT * NY * NX)
        .map(|i| if i < NY * NX { VX_FILL } else { i as i16 })
        .collect();
    let vx = ArrayBuilder::new(
        shape.clone(),
        DataType::Int16,
        chunks.clone().try_into()?,
        FillValue::from(VX_FILL),
    )
    .attributes(attrs(json!({
        "_ARRAY_DIMENSIONS": ["mid_date", "y", "x"],
        "scale_factor": 0.5,
        "add_offset": 0.0,
    })))
    .build(store.clone(), "/vx")?;
    vx.store_metadata()?;
    vx.store_array_subset_elements(&full, &raw_vx)?;

    let vy = ArrayBuilder::new(
        shape,
        DataType::Float64,
        chunks.try_into()?,
        FillValue::from(f64::NAN),
    )
    .build(store.clone(), "/vy")?;
    vy.store_metadata()?;
    vy.store_array_subset_elements(&full, &vec![-7.5f64; NT * NY * NX])?;

    Ok(())
}

fn simple_axes() -> CubeAxes {
    CubeAxes {
        x: regular_axis(-200_000.0, 120.0, NX),
        y: regular_axis(-2_100_000.0, -120.0, NY),
        days: mid_date_offsets(18262.0, 16.0, NT),
    }
}

async fn open(path: &Path) -> Arc<dyn VelocityCube> {
    ZarrCubeOpener::new()
        .open(&StorageLocator::Local(path.to_path_buf()), EpsgCode::POLAR_NORTH)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_open_reads_coordinates() {
    let dir = temp_test_dir();
    let path = dir.path().join("cube.zarr");
    let axes = simple_axes();
    write_cube(&path, &axes).unwrap();

    let cube = open(&path).await;
    assert_eq!(cube.epsg(), EpsgCode(3413));
    assert_eq!(cube.x(), axes.x.as_slice());
    assert_eq!(cube.y(), axes.y.as_slice());
    assert_eq!(
        cube.mid_date(),
        &[
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 17, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 2, 2, 0, 0, 0).unwrap(),
        ]
    );
    assert_eq!(cube.attrs()["GDAL_AREA_OR_POINT"], json!("Area"));
}

#[tokio::test]
async fn test_read_series_values() {
    let dir = temp_test_dir();
    let path = dir.path().join("cube.zarr");
    write_cube(&path, &simple_axes()).unwrap();
    let cube = open(&path).await;

    let v = cube.read_series("v", 2, 3).await.unwrap();
    assert_eq!(v, SeriesValues::Numeric(vec![203.0, 10203.0, 20203.0]));

    let vx = cube.read_series("vx", 1, 4).await.unwrap();
    match vx {
        SeriesValues::Numeric(values) => {
            assert!(values[0].is_nan());
            let flat = |t: usize| (t * NY * NX + NX + 4) as f64 * 0.5;
            assert_eq!(values[1], flat(1));
            assert_eq!(values[2], flat(2));
        }
        other => panic!("unexpected series: {:?}", other),
    }

    let vy = cube.read_series("vy", 0, 0).await.unwrap();
    assert_eq!(vy, SeriesValues::Numeric(vec![-7.5; NT]));
}

#[tokio::test]
async fn test_missing_variable() {
    let dir = temp_test_dir();
    let path = dir.path().join("cube.zarr");
    write_cube(&path, &simple_axes()).unwrap();
    let cube = open(&path).await;

    let err = cube.read_series("satellite_img1", 0, 0).await.unwrap_err();
    assert!(matches!(err, CubeError::MissingVariable(name) if name == "satellite_img1"));
    assert!(cube.read_series("v", NY, 0).await.is_err());
}

#[tokio::test]
async fn test_open_missing_store_fails() {
    let dir = temp_test_dir();
    let result = ZarrCubeOpener::new()
        .open(
            &StorageLocator::Local(dir.path().join("absent.zarr")),
            EpsgCode::POLAR_NORTH,
        )
        .await;
    assert!(matches!(result, Err(CubeError::OpenFailed { .. })));
}

#[tokio::test]
async fn test_session_over_local_zarr() {
    let point = QueryPoint::new(points::JAKOBSHAVN.0, points::JAKOBSHAVN.1).unwrap();
    let centre = to_projected(&point, EpsgCode::POLAR_NORTH).unwrap();
    let (cx, cy) = ((centre.x / 120.0).round() * 120.0, (centre.y / 120.0).round() * 120.0);
    let axes = CubeAxes {
        x: regular_axis(cx - 240.0, 120.0, NX),
        y: regular_axis(cy + 120.0, -120.0, NY),
        days: mid_date_offsets(18262.0, 16.0, NT),
    };

    let dir = temp_test_dir();
    let path = dir.path().join("jakobshavn.zarr");
    write_cube(&path, &axes).unwrap();

    let wgs84: Vec<(f64, f64)> = densified_square_ring(cx, cy, 50_000.0, 16)
        .into_iter()
        .map(|(x, y)| {
            let p = to_geographic(x, y, EpsgCode::POLAR_NORTH).unwrap();
            (p.lon, p.lat)
        })
        .collect();
    let feature = feature_json(
        &wgs84,
        3413,
        &square_ring(cx, cy, 50_000.0),
        path.to_str().unwrap(),
    );
    let catalog = Catalog::from_feature_collection(feature_collection(vec![feature])).unwrap();
    let session = CubeSession::with_catalog(
        catalog,
        Arc::new(ZarrCubeOpener::new()),
        SessionConfig::default(),
    );

    let results = session
        .get_time_series(&[points::JAKOBSHAVN], &["v"])
        .await
        .unwrap();
    assert_eq!(results.len(), 1);

    // Nearest cell is the snapped centre: column 2, row 1.
    let result = &results[0];
    assert_eq!(result.returned_point_projected_coordinates.x, cx);
    assert_eq!(result.returned_point_projected_coordinates.y, cy);
    assert_eq!(
        result.time_series.numeric("v").unwrap(),
        &[102.0, 10102.0, 20102.0]
    );
    assert!(result.time_series.get("mission_img1").is_none());
    assert_eq!(session.cache().stats().await.opens, 1);
}

//! Zarr-backed velocity cubes.
//!
//! Published cubes live in the public `its-live-data` bucket and are read
//! anonymously through `object_store`. The synchronous `zarrs` API drives
//! the async store through an adapter, so every store access runs on the
//! blocking thread pool.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use object_store::aws::AmazonS3Builder;
use object_store::http::HttpBuilder;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use zarrs::array::{Array, ArrayCreateError, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs::storage::{ReadableStorage, ReadableStorageTraits};
use zarrs_filesystem::FilesystemStore;
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::storage_adapter::async_to_sync::{
    AsyncToSyncBlockOn, AsyncToSyncStorageAdapter,
};

use cube_catalog::StorageLocator;
use velocity_common::EpsgCode;

use crate::cube::VelocityCube;
use crate::error::{CubeError, Result};
use crate::opener::CubeOpener;
use crate::series::SeriesValues;
use crate::time::TimeUnits;

/// Region of the public ITS_LIVE bucket.
pub const DEFAULT_S3_REGION: &str = "us-west-2";

/// Dimension order assumed when a variable does not declare one.
const DEFAULT_DIMENSIONS: [&str; 3] = ["mid_date", "y", "x"];

/// Drives store futures from blocking pool threads on a captured runtime.
#[derive(Clone)]
pub struct HandleBlockOn(Handle);

impl AsyncToSyncBlockOn for HandleBlockOn {
    fn block_on<F: core::future::Future>(&self, future: F) -> F::Output {
        self.0.block_on(future)
    }
}

/// Opens Zarr cubes from S3, HTTP or the local filesystem.
#[derive(Debug, Clone)]
pub struct ZarrCubeOpener {
    s3_region: String,
}

impl Default for ZarrCubeOpener {
    fn default() -> Self {
        Self {
            s3_region: DEFAULT_S3_REGION.to_string(),
        }
    }
}

impl ZarrCubeOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_s3_region(mut self, region: impl Into<String>) -> Self {
        self.s3_region = region.into();
        self
    }

    /// Build the store and the path of the cube root inside it.
    fn storage(&self, locator: &StorageLocator) -> Result<(ReadableStorage, String)> {
        let failed = |e: &dyn std::fmt::Display| CubeError::open_failed(locator.to_string(), e.to_string());

        match locator {
            StorageLocator::S3 { bucket, key } => {
                let s3 = AmazonS3Builder::new()
                    .with_bucket_name(bucket)
                    .with_region(&self.s3_region)
                    .with_skip_signature(true)
                    .build()
                    .map_err(|e| failed(&e))?;
                let store: ReadableStorage = Arc::new(AsyncToSyncStorageAdapter::new(
                    Arc::new(AsyncObjectStore::new(s3)),
                    HandleBlockOn(Handle::current()),
                ));
                Ok((store, format!("/{}", key.trim_matches('/'))))
            }
            StorageLocator::Http { url } => {
                let http = HttpBuilder::new().with_url(url).build().map_err(|e| failed(&e))?;
                let store: ReadableStorage = Arc::new(AsyncToSyncStorageAdapter::new(
                    Arc::new(AsyncObjectStore::new(http)),
                    HandleBlockOn(Handle::current()),
                ));
                Ok((store, String::new()))
            }
            StorageLocator::Local(path) => {
                let store: ReadableStorage =
                    Arc::new(FilesystemStore::new(path).map_err(|e| failed(&e))?);
                Ok((store, String::new()))
            }
        }
    }
}

#[async_trait]
impl CubeOpener for ZarrCubeOpener {
    #[instrument(skip_all, fields(locator = %locator, epsg = epsg.code()))]
    async fn open(&self, locator: &StorageLocator, epsg: EpsgCode) -> Result<Arc<dyn VelocityCube>> {
        let (storage, root) = self.storage(locator)?;
        let locator = locator.to_string();

        let cube = tokio::task::spawn_blocking(move || ZarrCube::open(storage, root, locator, epsg))
            .await
            .map_err(|e| CubeError::read_failed(e.to_string()))??;

        Ok(Arc::new(cube))
    }
}

/// A cube backed by a Zarr group with `x`, `y` and `mid_date` coordinates.
pub struct ZarrCube {
    locator: String,
    storage: ReadableStorage,
    root: String,
    epsg: EpsgCode,
    attrs: Map<String, Value>,
    x: Vec<f64>,
    y: Vec<f64>,
    mid_date: Vec<DateTime<Utc>>,
    variables: Mutex<HashMap<String, Arc<VariableArray>>>,
}

impl ZarrCube {
    /// Open the cube group and read its coordinates. Blocking.
    pub fn open(
        storage: ReadableStorage,
        root: String,
        locator: String,
        catalog_epsg: EpsgCode,
    ) -> Result<Self> {
        let group_path = if root.is_empty() { "/".to_string() } else { root.clone() };
        let group = Group::open(storage.clone(), &group_path)
            .map_err(|e| CubeError::open_failed(&locator, e.to_string()))?;
        let attrs = group.attributes().clone();

        let epsg = match attrs.get("projection") {
            Some(value) => match serde_json::from_value::<EpsgCode>(value.clone()) {
                Ok(epsg) => epsg,
                Err(e) => {
                    warn!(cube = %locator, error = %e, "Unreadable projection attribute, using catalog EPSG");
                    catalog_epsg
                }
            },
            None => catalog_epsg,
        };
        if epsg != catalog_epsg {
            warn!(
                cube = %locator,
                cube_epsg = epsg.code(),
                catalog_epsg = catalog_epsg.code(),
                "Cube projection differs from catalog"
            );
        }

        let coordinate = |name: &str| -> Result<Vec<f64>> {
            let variable = VariableArray::open(storage.clone(), &variable_path(&root, name), name)?;
            variable.read_all()
        };
        let x = coordinate("x")?;
        let y = coordinate("y")?;

        let time = VariableArray::open(storage.clone(), &variable_path(&root, "mid_date"), "mid_date")?;
        let units = time
            .attrs()
            .get("units")
            .and_then(Value::as_str)
            .ok_or_else(|| CubeError::invalid_metadata("mid_date has no units attribute"))?;
        let units = TimeUnits::parse(units)?;
        let mid_date = time
            .read_all()?
            .into_iter()
            .map(|t| units.decode(t))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            cube = %locator,
            epsg = epsg.code(),
            nx = x.len(),
            ny = y.len(),
            nt = mid_date.len(),
            "Read cube coordinates"
        );

        Ok(Self {
            locator,
            storage,
            root,
            epsg,
            attrs,
            x,
            y,
            mid_date,
            variables: Mutex::new(HashMap::new()),
        })
    }

    async fn variable(&self, name: &str) -> Result<Arc<VariableArray>> {
        if let Some(variable) = self.variables.lock().await.get(name) {
            return Ok(variable.clone());
        }

        let storage = self.storage.clone();
        let path = variable_path(&self.root, name);
        let owned_name = name.to_string();
        let variable = tokio::task::spawn_blocking(move || VariableArray::open(storage, &path, &owned_name))
            .await
            .map_err(|e| CubeError::read_failed(e.to_string()))??;
        let variable = Arc::new(variable);

        self.variables
            .lock()
            .await
            .insert(name.to_string(), variable.clone());
        Ok(variable)
    }
}

#[async_trait]
impl VelocityCube for ZarrCube {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn epsg(&self) -> EpsgCode {
        self.epsg
    }

    fn x(&self) -> &[f64] {
        &self.x
    }

    fn y(&self) -> &[f64] {
        &self.y
    }

    fn mid_date(&self) -> &[DateTime<Utc>] {
        &self.mid_date
    }

    fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    async fn read_series(&self, name: &str, row: usize, col: usize) -> Result<SeriesValues> {
        let variable = self.variable(name).await?;
        let n_time = self.mid_date.len();
        tokio::task::spawn_blocking(move || variable.read_point(row, col, n_time))
            .await
            .map_err(|e| CubeError::read_failed(e.to_string()))?
    }
}

fn variable_path(root: &str, name: &str) -> String {
    format!("{}/{}", root, name)
}

/// One Zarr array with its CF decoding attributes.
struct VariableArray {
    name: String,
    array: Array<dyn ReadableStorageTraits>,
    dims: Vec<String>,
    fill_value: Option<f64>,
    attr_fill_value: Option<f64>,
    scale_factor: f64,
    add_offset: f64,
}

impl VariableArray {
    fn open(storage: ReadableStorage, path: &str, name: &str) -> Result<Self> {
        let array = match Array::open(storage, path) {
            Ok(array) => array,
            Err(ArrayCreateError::MissingMetadata) => {
                return Err(CubeError::MissingVariable(name.to_string()))
            }
            Err(e) => return Err(CubeError::invalid_metadata(format!("{}: {}", name, e))),
        };

        let attrs = array.attributes();
        let dims = match attrs.get("_ARRAY_DIMENSIONS").and_then(Value::as_array) {
            Some(dims) => dims
                .iter()
                .map(|d| d.as_str().unwrap_or_default().to_string())
                .collect(),
            None => default_dimensions(name, array.shape().len()),
        };
        if dims.len() != array.shape().len() {
            return Err(CubeError::invalid_metadata(format!(
                "{} declares {} dimensions but has shape {:?}",
                name,
                dims.len(),
                array.shape()
            )));
        }

        let fill_value = decode_fill_value(array.data_type(), array.fill_value().as_ne_bytes());
        let attr_fill_value = attrs
            .get("_FillValue")
            .or_else(|| attrs.get("missing_value"))
            .and_then(Value::as_f64);
        let scale_factor = attrs.get("scale_factor").and_then(Value::as_f64).unwrap_or(1.0);
        let add_offset = attrs.get("add_offset").and_then(Value::as_f64).unwrap_or(0.0);

        Ok(Self {
            name: name.to_string(),
            array,
            dims,
            fill_value,
            attr_fill_value,
            scale_factor,
            add_offset,
        })
    }

    fn attrs(&self) -> &Map<String, Value> {
        self.array.attributes()
    }

    /// Read the whole array as decoded numbers.
    fn read_all(&self) -> Result<Vec<f64>> {
        let subset = ArraySubset::new_with_shape(self.array.shape().to_vec());
        self.read_numeric(&subset)
    }

    /// Read the time series at `(row, col)`.
    fn read_point(&self, row: usize, col: usize, n_time: usize) -> Result<SeriesValues> {
        if !self.dims.iter().any(|d| d == "mid_date") {
            return Err(CubeError::invalid_metadata(format!(
                "{} has no mid_date dimension",
                self.name
            )));
        }

        let shape = self.array.shape();
        let mut ranges: Vec<Range<u64>> = Vec::with_capacity(self.dims.len());
        for (dim, &len) in self.dims.iter().zip(shape) {
            let range = match dim.as_str() {
                "mid_date" => 0..len,
                "y" => row as u64..row as u64 + 1,
                "x" => col as u64..col as u64 + 1,
                other if len == 1 => {
                    debug!(variable = %self.name, dimension = other, "Selecting singleton dimension");
                    0..1
                }
                other => {
                    return Err(CubeError::invalid_metadata(format!(
                        "{} has unsupported dimension {}",
                        self.name, other
                    )))
                }
            };
            if range.end > len {
                return Err(CubeError::read_failed(format!(
                    "{} index {} out of range for dimension {} of length {}",
                    self.name,
                    range.end - 1,
                    dim,
                    len
                )));
            }
            ranges.push(range);
        }
        let subset = ArraySubset::new_with_ranges(&ranges);

        let values = if matches!(self.array.data_type(), DataType::String) {
            let labels = self
                .array
                .retrieve_array_subset_elements::<String>(&subset)
                .map_err(|e| CubeError::read_failed(format!("{}: {}", self.name, e)))?;
            SeriesValues::Text(
                labels
                    .into_iter()
                    .map(|s| if s.is_empty() { None } else { Some(s) })
                    .collect(),
            )
        } else {
            SeriesValues::Numeric(self.read_numeric(&subset)?)
        };

        if values.len() != n_time {
            return Err(CubeError::invalid_metadata(format!(
                "{} has {} time steps, expected {}",
                self.name,
                values.len(),
                n_time
            )));
        }
        Ok(values)
    }

    /// Read `subset` as f64 with fill values masked and scaling applied.
    fn read_numeric(&self, subset: &ArraySubset) -> Result<Vec<f64>> {
        let raw = retrieve_f64(&self.array, subset)
            .map_err(|e| match e {
                CubeError::ReadFailed(msg) => CubeError::read_failed(format!("{}: {}", self.name, msg)),
                other => other,
            })?;

        Ok(raw
            .into_iter()
            .map(|v| {
                if v.is_nan() || Some(v) == self.fill_value || Some(v) == self.attr_fill_value {
                    f64::NAN
                } else {
                    v * self.scale_factor + self.add_offset
                }
            })
            .collect())
    }
}

fn default_dimensions(name: &str, ndim: usize) -> Vec<String> {
    match (name, ndim) {
        ("x" | "y" | "mid_date", 1) => vec![name.to_string()],
        (_, 1) => vec!["mid_date".to_string()],
        _ => DEFAULT_DIMENSIONS[DEFAULT_DIMENSIONS.len().saturating_sub(ndim)..]
            .iter()
            .map(|d| d.to_string())
            .collect(),
    }
}

macro_rules! retrieve_as_f64 {
    ($array:expr, $subset:expr, $t:ty) => {
        $array
            .retrieve_array_subset_elements::<$t>($subset)
            .map_err(|e| CubeError::read_failed(e.to_string()))?
            .into_iter()
            .map(|v| v as f64)
            .collect()
    };
}

fn retrieve_f64(array: &Array<dyn ReadableStorageTraits>, subset: &ArraySubset) -> Result<Vec<f64>> {
    let values = match array.data_type() {
        DataType::Float64 => retrieve_as_f64!(array, subset, f64),
        DataType::Float32 => retrieve_as_f64!(array, subset, f32),
        DataType::Int64 => retrieve_as_f64!(array, subset, i64),
        DataType::Int32 => retrieve_as_f64!(array, subset, i32),
        DataType::Int16 => retrieve_as_f64!(array, subset, i16),
        DataType::Int8 => retrieve_as_f64!(array, subset, i8),
        DataType::UInt64 => retrieve_as_f64!(array, subset, u64),
        DataType::UInt32 => retrieve_as_f64!(array, subset, u32),
        DataType::UInt16 => retrieve_as_f64!(array, subset, u16),
        DataType::UInt8 => retrieve_as_f64!(array, subset, u8),
        other => {
            return Err(CubeError::invalid_metadata(format!(
                "unsupported data type {:?}",
                other
            )))
        }
    };
    Ok(values)
}

/// Interpret the array fill value for numeric data types.
fn decode_fill_value(data_type: &DataType, bytes: &[u8]) -> Option<f64> {
    macro_rules! from_ne {
        ($t:ty) => {
            bytes.try_into().ok().map(<$t>::from_ne_bytes).map(|v| v as f64)
        };
    }
    let value = match data_type {
        DataType::Float64 => from_ne!(f64),
        DataType::Float32 => from_ne!(f32),
        DataType::Int64 => from_ne!(i64),
        DataType::Int32 => from_ne!(i32),
        DataType::Int16 => from_ne!(i16),
        DataType::Int8 => from_ne!(i8),
        DataType::UInt64 => from_ne!(u64),
        DataType::UInt32 => from_ne!(u32),
        DataType::UInt16 => from_ne!(u16),
        DataType::UInt8 => from_ne!(u8),
        _ => None,
    };
    value.filter(|v| !v.is_nan())
}

//! In-memory cubes and an opener serving them.
//!
//! Used for offline sessions and tests: cubes are registered under the
//! display form of their storage locator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cube_catalog::StorageLocator;
use serde_json::{Map, Value};
use velocity_common::EpsgCode;

use crate::cube::VelocityCube;
use crate::error::{CubeError, Result};
use crate::opener::CubeOpener;
use crate::series::SeriesValues;

#[derive(Debug, Clone)]
enum MemoryVariable {
    /// `[mid_date, y, x]` values in C order.
    Grid(Vec<f64>),
    /// One value per `mid_date` entry.
    Text(Vec<Option<String>>),
}

/// A cube held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryCube {
    locator: String,
    epsg: EpsgCode,
    x: Vec<f64>,
    y: Vec<f64>,
    mid_date: Vec<DateTime<Utc>>,
    attrs: Map<String, Value>,
    variables: HashMap<String, MemoryVariable>,
}

impl MemoryCube {
    pub fn new(
        locator: impl Into<String>,
        epsg: EpsgCode,
        x: Vec<f64>,
        y: Vec<f64>,
        mid_date: Vec<DateTime<Utc>>,
    ) -> Self {
        let mut attrs = Map::new();
        attrs.insert("projection".to_string(), Value::String(epsg.code().to_string()));
        Self {
            locator: locator.into(),
            epsg,
            x,
            y,
            mid_date,
            attrs,
            variables: HashMap::new(),
        }
    }

    /// Add a numeric variable laid out as `[mid_date, y, x]`.
    pub fn with_grid(mut self, name: &str, values: Vec<f64>) -> Result<Self> {
        let expected = self.mid_date.len() * self.y.len() * self.x.len();
        if values.len() != expected {
            return Err(CubeError::invalid_metadata(format!(
                "variable {} has {} values, expected {}",
                name,
                values.len(),
                expected
            )));
        }
        self.variables
            .insert(name.to_string(), MemoryVariable::Grid(values));
        Ok(self)
    }

    /// Add a text variable with one entry per time step.
    pub fn with_text(mut self, name: &str, values: Vec<Option<String>>) -> Result<Self> {
        if values.len() != self.mid_date.len() {
            return Err(CubeError::invalid_metadata(format!(
                "variable {} has {} values, expected {}",
                name,
                values.len(),
                self.mid_date.len()
            )));
        }
        self.variables
            .insert(name.to_string(), MemoryVariable::Text(values));
        Ok(self)
    }

    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }
}

#[async_trait]
impl VelocityCube for MemoryCube {
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
        let (ny, nx) = (self.y.len(), self.x.len());
        if row >= ny || col >= nx {
            return Err(CubeError::read_failed(format!(
                "cell ({}, {}) outside {}x{} grid",
                row, col, ny, nx
            )));
        }
        match self.variables.get(name) {
            Some(MemoryVariable::Grid(values)) => Ok(SeriesValues::Numeric(
                (0..self.mid_date.len())
                    .map(|t| values[t * ny * nx + row * nx + col])
                    .collect(),
            )),
            Some(MemoryVariable::Text(values)) => Ok(SeriesValues::Text(values.clone())),
            None => Err(CubeError::MissingVariable(name.to_string())),
        }
    }
}

/// Opener over a fixed set of in-memory cubes that counts its opens.
#[derive(Default)]
pub struct MemoryCubeOpener {
    cubes: HashMap<String, Arc<MemoryCube>>,
    delay: Option<Duration>,
    opens: AtomicU64,
}

impl MemoryCubeOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cube under its locator.
    pub fn with_cube(mut self, cube: MemoryCube) -> Self {
        self.cubes.insert(cube.locator.clone(), Arc::new(cube));
        self
    }

    /// Sleep this long in every open.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `open` calls so far.
    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CubeOpener for MemoryCubeOpener {
    async fn open(&self, locator: &StorageLocator, _epsg: EpsgCode) -> Result<Arc<dyn VelocityCube>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = locator.to_string();
        match self.cubes.get(&key) {
            Some(cube) => Ok(cube.clone() as Arc<dyn VelocityCube>),
            None => Err(CubeError::open_failed(key, "no such cube")),
        }
    }
}

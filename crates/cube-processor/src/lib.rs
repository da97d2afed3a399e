//! Velocity cube access and point time-series extraction.
//!
//! A [`CubeSession`] owns a loaded catalog and a [`CubeCache`] of open
//! cubes. For each query point it resolves the covering cube, opens it at
//! most once, and slices the cell nearest to the point along the time axis.
//!
//! # Architecture
//!
//! ```text
//! get_time_series(points, variables)
//!      │
//!      ├─► Catalog::find_by_point (WGS84 match, native-projection check)
//!      │
//!      ├─► CubeCache::get_or_open(locator)
//!      │         │
//!      │         ├─► Cache hit: shared handle, no I/O
//!      │         │
//!      │         └─► Cache miss: CubeOpener::open (single flight, timeout)
//!      │
//!      └─► extract_time_series
//!               │
//!               ├─► Reproject point, nearest x / y
//!               │
//!               └─► Read each variable at (row, col) over mid_date
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cube_processor::{CubeSession, SessionConfig};
//!
//! let session = CubeSession::open(SessionConfig::from_env()).await?;
//! let results = session.get_time_series(&[(-49.09, 70.0)], &["v"]).await?;
//! for result in &results {
//!     println!("{} steps from {}", result.time_series.len(), result.storage_locator);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod cube;
pub mod error;
pub mod memory;
pub mod opener;
pub mod series;
pub mod session;
pub mod time;
pub mod zarr;

// Re-export commonly used types at crate root
pub use cache::{CubeCache, CubeCacheStats};
pub use config::SessionConfig;
pub use cube::{nearest_index, VelocityCube};
pub use error::{CubeError, Result};
pub use memory::{MemoryCube, MemoryCubeOpener};
pub use opener::CubeOpener;
pub use series::{
    extract_time_series, merge_default_variables, PointOutcome, SeriesValues, TimeSeries,
    TimeSeriesResult, CORE_VARIABLES, DEFAULT_VARIABLES,
};
pub use session::CubeSession;
pub use zarr::{ZarrCube, ZarrCubeOpener};

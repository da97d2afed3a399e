//! Opening cubes from their storage locators.

use std::sync::Arc;

use async_trait::async_trait;
use cube_catalog::StorageLocator;
use velocity_common::EpsgCode;

use crate::cube::VelocityCube;
use crate::error::Result;

/// Opens a cube store.
///
/// `epsg` is the projection recorded in the catalog; openers use it when
/// the cube itself does not declare one.
#[async_trait]
pub trait CubeOpener: Send + Sync {
    async fn open(&self, locator: &StorageLocator, epsg: EpsgCode) -> Result<Arc<dyn VelocityCube>>;
}

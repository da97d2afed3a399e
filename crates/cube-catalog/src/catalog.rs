//! The parsed cube catalog.

use serde_json::Value;
use tracing::{debug, warn};

use velocity_common::{VelocityError, VelocityResult};

use crate::feature::CatalogFeature;
use crate::geojson::FeatureCollectionDocument;

/// Ordered, immutable collection of cube features.
///
/// A session holds the catalog behind an `Arc`; reloading builds a new
/// catalog and swaps it in rather than mutating this one.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    features: Vec<CatalogFeature>,
    skipped: usize,
}

impl Catalog {
    /// Create a catalog from parsed features, keeping their order.
    pub fn new(features: Vec<CatalogFeature>) -> Self {
        Self {
            features,
            skipped: 0,
        }
    }

    /// Parse a GeoJSON FeatureCollection document.
    pub fn from_geojson_str(s: &str) -> VelocityResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_feature_collection(value)
    }

    /// Build from an already-decoded FeatureCollection.
    ///
    /// Features that fail to parse are skipped with a warning.
    pub fn from_feature_collection(value: Value) -> VelocityResult<Self> {
        let document: FeatureCollectionDocument = serde_json::from_value(value)?;
        if document.type_ != "FeatureCollection" {
            return Err(VelocityError::InvalidCatalog(format!(
                "expected a FeatureCollection, got '{}'",
                document.type_
            )));
        }

        let total = document.features.len();
        let mut features = Vec::with_capacity(total);
        let mut skipped = 0;
        for (index, raw) in document.features.into_iter().enumerate() {
            match CatalogFeature::from_geojson(raw) {
                Ok(feature) => features.push(feature),
                Err(e) => {
                    skipped += 1;
                    warn!(index = index, error = %e, "Skipping malformed catalog feature");
                }
            }
        }

        debug!(
            features = features.len(),
            skipped = skipped,
            "Parsed cube catalog"
        );

        Ok(Self { features, skipped })
    }

    pub fn features(&self) -> &[CatalogFeature] {
        &self.features
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogFeature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of features dropped while parsing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

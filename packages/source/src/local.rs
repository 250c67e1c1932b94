//! Local feature containers.
//!
//! The local source ships as a prebuilt container of point features. How
//! the container is stored is behind [`FeatureContainer`]; the bundled
//! implementation reads a `GeoJSON` feature collection, optionally split
//! into named layers.

use std::collections::BTreeMap;
use std::path::Path;

use accident_map_source_models::Marker;

use crate::SourceError;
use crate::marker::{SkipReason, from_feature};

/// A store of point features grouped into named layers.
pub trait FeatureContainer: Send + Sync {
    /// All features of `layer`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the layer does not exist or cannot be
    /// read.
    fn features(&self, layer: &str) -> Result<Vec<geojson::Feature>, SourceError>;
}

/// A `GeoJSON` container.
///
/// A plain `FeatureCollection` is served under every layer name. Features
/// carrying a `layer` property are additionally grouped by it, so one file
/// can hold several layers.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonContainer {
    features: Vec<geojson::Feature>,
}

impl GeoJsonContainer {
    #[must_use]
    pub const fn new(features: Vec<geojson::Feature>) -> Self {
        Self { features }
    }

    /// Parses a `GeoJSON` document holding a feature collection.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Normalization`] if the text is not a
    /// `GeoJSON` feature collection.
    pub fn parse(text: &str) -> Result<Self, SourceError> {
        let document: geojson::GeoJson =
            text.parse().map_err(|e: geojson::Error| SourceError::Normalization {
                message: format!("invalid GeoJSON: {e}"),
            })?;
        match document {
            geojson::GeoJson::FeatureCollection(collection) => Ok(Self::new(collection.features)),
            geojson::GeoJson::Feature(feature) => Ok(Self::new(vec![feature])),
            geojson::GeoJson::Geometry(_) => Err(SourceError::Normalization {
                message: "expected a GeoJSON feature collection, found a bare geometry"
                    .to_string(),
            }),
        }
    }

    /// Reads and parses a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    fn layers(&self) -> BTreeMap<&str, usize> {
        let mut layers = BTreeMap::new();
        for feature in &self.features {
            if let Some(layer) = layer_of(feature) {
                *layers.entry(layer).or_default() += 1;
            }
        }
        layers
    }
}

fn layer_of(feature: &geojson::Feature) -> Option<&str> {
    feature
        .properties
        .as_ref()
        .and_then(|properties| properties.get("layer"))
        .and_then(serde_json::Value::as_str)
}

impl FeatureContainer for GeoJsonContainer {
    fn features(&self, layer: &str) -> Result<Vec<geojson::Feature>, SourceError> {
        let layers = self.layers();
        if layers.is_empty() {
            return Ok(self.features.clone());
        }
        if !layers.contains_key(layer) {
            return Err(SourceError::Normalization {
                message: format!(
                    "layer {layer:?} not found (available: {})",
                    layers.keys().copied().collect::<Vec<_>>().join(", ")
                ),
            });
        }
        Ok(self
            .features
            .iter()
            .filter(|feature| layer_of(feature) == Some(layer))
            .cloned()
            .collect())
    }
}

/// Markers built from a local container.
#[derive(Debug, Default)]
pub struct LocalBatch {
    pub markers: Vec<Marker>,
    /// Features that could not become markers, by reason.
    pub skipped: BTreeMap<SkipReason, u64>,
}

impl LocalBatch {
    #[must_use]
    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }
}

/// Builds markers for every valid point feature of `layer`.
///
/// # Errors
///
/// Returns [`SourceError`] if the container cannot provide the layer.
/// Invalid features are counted, not returned as errors.
pub fn read_markers(
    container: &dyn FeatureContainer,
    layer: &str,
) -> Result<LocalBatch, SourceError> {
    let mut batch = LocalBatch::default();

    for feature in container.features(layer)? {
        match from_feature(feature) {
            Ok(marker) => batch.markers.push(marker),
            Err(reason) => *batch.skipped.entry(reason).or_default() += 1,
        }
    }

    if batch.skipped_total() > 0 {
        log::warn!(
            "Skipped {} local features without valid point geometry",
            batch.skipped_total()
        );
    }

    Ok(batch)
}

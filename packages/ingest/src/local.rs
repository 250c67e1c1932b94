//! Loading the local container into its registry.

use accident_map_ingest_models::LocalLoadResult;
use accident_map_layers::SourceRegistry;
use accident_map_source::local::{FeatureContainer, read_markers};

use crate::IngestError;

/// Replaces the registry's markers with the point features of `layer`.
///
/// # Errors
///
/// Returns [`IngestError`] if the container cannot provide the layer. The
/// registry is left empty in that case.
pub fn try_load_local(
    container: &dyn FeatureContainer,
    layer: &str,
    registry: &SourceRegistry,
) -> Result<LocalLoadResult, IngestError> {
    registry.clear();
    let batch = read_markers(container, layer)?;
    let skipped = batch.skipped_total();
    let marker_count = registry.register_all(batch.markers)?;

    log::info!("Loaded {marker_count} local markers from layer {layer:?}");

    Ok(LocalLoadResult {
        marker_count,
        skipped,
    })
}

/// Like [`try_load_local`], but a failure is logged and leaves the source
/// without markers.
pub fn load_local(
    container: &dyn FeatureContainer,
    layer: &str,
    registry: &SourceRegistry,
) -> LocalLoadResult {
    try_load_local(container, layer, registry).unwrap_or_else(|e| {
        log::error!("Failed to load local accident data: {e}");
        registry.clear();
        LocalLoadResult::default()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use accident_map_layers::Selection;
    use accident_map_source::SourceError;
    use accident_map_source::local::GeoJsonContainer;
    use accident_map_source_models::DataSource;

    use super::*;

    fn registry() -> SourceRegistry {
        SourceRegistry::new(DataSource::Local, Arc::new(Selection::new()))
    }

    fn point(lng: f64, lat: f64, layer: &str) -> geojson::Feature {
        serde_json::from_value(serde_json::json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [lng, lat] },
            "properties": { "layer": layer, "sum_bike": 1, "sum_injured_bike": 1 }
        }))
        .unwrap()
    }

    struct Broken;

    impl FeatureContainer for Broken {
        fn features(&self, _layer: &str) -> Result<Vec<geojson::Feature>, SourceError> {
            Err(SourceError::Normalization {
                message: "corrupt container".to_string(),
            })
        }
    }

    #[test]
    fn registers_layer_features() {
        let container = GeoJsonContainer::new(vec![
            point(8.4, 49.0, "accidents"),
            point(8.5, 49.1, "accidents"),
            point(8.6, 49.2, "other"),
        ]);
        let registry = registry();

        let result = load_local(&container, "accidents", &registry);

        assert_eq!(result.marker_count, 2);
        assert_eq!(result.skipped, 0);
        assert_eq!(registry.visible_count(), 2);
    }

    #[test]
    fn reload_replaces_previous_markers() {
        let container = GeoJsonContainer::new(vec![point(8.4, 49.0, "accidents")]);
        let registry = registry();

        load_local(&container, "accidents", &registry);
        load_local(&container, "accidents", &registry);

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn broken_container_renders_nothing() {
        let registry = registry();
        load_local(
            &GeoJsonContainer::new(vec![point(8.4, 49.0, "accidents")]),
            "accidents",
            &registry,
        );

        let result = load_local(&Broken, "accidents", &registry);

        assert_eq!(result, LocalLoadResult::default());
        assert!(registry.is_empty());
        assert!(matches!(
            try_load_local(&Broken, "accidents", &registry),
            Err(IngestError::Source(SourceError::Normalization { .. }))
        ));
    }
}

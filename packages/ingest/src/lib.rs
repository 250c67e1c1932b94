#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading accident markers into the map layers.
//!
//! [`AccidentMap`] wires the marker registries, the Unfallatlas load
//! orchestrator, and the active-source switch together. It is built once
//! and handed to whatever drives the map.

pub mod local;
pub mod unfallatlas_layer;

use std::sync::Arc;

use accident_map_ingest_models::SourceSummary;
use accident_map_layers::{
    DataSourceSwitch, MarkerLayers, RegistryError, SourceLayer, SourceRegistry,
};
use accident_map_source::SourceError;
use accident_map_source::catalog::UnfallatlasCatalog;
use accident_map_source::transport::Transport;
use accident_map_source_models::{DataSource, YearSet};

pub use unfallatlas_layer::UnfallatlasLayer;

/// Environment variable naming the base URL or directory of the data files.
pub const DATA_URL_ENV: &str = "ACCIDENT_MAP_DATA_URL";

/// Environment variable listing the initially requested years.
pub const YEARS_ENV: &str = "ACCIDENT_MAP_YEARS";

/// Errors raised while loading markers.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// The data location from the `--data` flag or [`DATA_URL_ENV`].
#[must_use]
pub fn data_location(cli_value: Option<String>) -> Option<String> {
    cli_value.or_else(|| std::env::var(DATA_URL_ENV).ok())
}

/// The initial year request from the `--years` flag or [`YEARS_ENV`].
///
/// Returns `None` when neither is set, so the available years are used.
#[must_use]
pub fn requested_years(cli_value: Option<String>) -> Option<YearSet> {
    cli_value
        .or_else(|| std::env::var(YEARS_ENV).ok())
        .map(|list| YearSet::parse_list(&list))
}

/// Registered and visible marker counts of `registry`.
#[must_use]
pub fn summarize(registry: &SourceRegistry) -> SourceSummary {
    SourceSummary {
        source: registry.source(),
        registered: registry.len(),
        visible: registry.visible_count(),
    }
}

/// Builds the Unfallatlas layer from the embedded source configuration.
///
/// # Panics
///
/// Panics if the embedded Unfallatlas config is not a yearly CSV source.
#[must_use]
pub fn unfallatlas_layer(transport: Arc<dyn Transport>, layers: &MarkerLayers) -> UnfallatlasLayer {
    let definition = accident_map_source::registry::source(DataSource::Unfallatlas);
    let config = definition
        .yearly_csv()
        .cloned()
        .unwrap_or_else(|| panic!("{} is not configured as yearly CSV", definition.name));
    let parser = config.parser(&definition.name);

    UnfallatlasLayer::new(
        Arc::new(UnfallatlasCatalog::new(transport, config)),
        parser,
        Arc::clone(layers.registry(DataSource::Unfallatlas)),
    )
}

/// All layers of the map plus the source switch.
#[derive(Debug)]
pub struct AccidentMap {
    layers: MarkerLayers,
    unfallatlas: UnfallatlasLayer,
    switch: DataSourceSwitch,
}

impl AccidentMap {
    /// Builds the map with the local source active but not yet shown.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let layers = MarkerLayers::new();
        let unfallatlas = unfallatlas_layer(transport, &layers);
        Self::with_layers(layers, unfallatlas)
    }

    /// Builds the map around an existing Unfallatlas layer. The layer must
    /// use the Unfallatlas registry of `layers`.
    #[must_use]
    pub fn with_layers(layers: MarkerLayers, unfallatlas: UnfallatlasLayer) -> Self {
        let local: Arc<dyn SourceLayer> = layers.registry(DataSource::Local).clone();
        let remote: Arc<dyn SourceLayer> = Arc::new(unfallatlas.clone());
        let switch = DataSourceSwitch::new([
            (DataSource::Local, local),
            (DataSource::Unfallatlas, remote),
        ]);
        Self {
            layers,
            unfallatlas,
            switch,
        }
    }

    #[must_use]
    pub const fn layers(&self) -> &MarkerLayers {
        &self.layers
    }

    #[must_use]
    pub const fn unfallatlas(&self) -> &UnfallatlasLayer {
        &self.unfallatlas
    }

    #[must_use]
    pub const fn switch(&self) -> &DataSourceSwitch {
        &self.switch
    }
}

#[cfg(test)]
mod tests {
    use accident_map_ingest_models::LoadPhase;
    use accident_map_source::transport::MemoryTransport;

    use super::*;

    const CSV: &str = "UJAHR;UMONAT;USTUNDE;UKATEGORIE;IstRad;IstFuss;IstPKW;IstKrad;IstGkfz;IstSonstige;XGCSWGS84;YGCSWGS84\n\
        2022;5;14;1;1;0;0;0;0;0;13,4050;52,5200\n";

    #[test]
    fn cli_values_win_over_the_environment() {
        assert_eq!(
            data_location(Some("./data".to_string())).as_deref(),
            Some("./data")
        );
        assert_eq!(
            requested_years(Some("2023, 2021,x".to_string())),
            Some(YearSet::new([2021, 2023]))
        );
    }

    #[test]
    fn embedded_unfallatlas_config_builds_a_layer() {
        let map = AccidentMap::new(Arc::new(MemoryTransport::new()));
        assert!(Arc::ptr_eq(
            map.unfallatlas().registry(),
            map.layers().registry(DataSource::Unfallatlas)
        ));
        assert_eq!(map.switch().active(), DataSource::Local);
        assert!(!map.unfallatlas().is_visible());
    }

    #[tokio::test]
    async fn switching_sources_loads_and_hides() {
        let transport = Arc::new(MemoryTransport::new().with_file("data/unfallatlas/2022.csv", CSV));
        let layers = MarkerLayers::new();
        let unfallatlas = unfallatlas_layer(transport, &layers).with_years(YearSet::new([2022]));
        let map = AccidentMap::with_layers(layers, unfallatlas);

        map.switch().show_active();
        assert!(map.layers().registry(DataSource::Local).render_group().is_attached());

        map.switch().set_data_source(DataSource::Unfallatlas);
        assert_eq!(map.unfallatlas().phase(), LoadPhase::Loading);
        map.unfallatlas().wait_until_idle().await;

        let registry = map.layers().registry(DataSource::Unfallatlas);
        assert_eq!(registry.visible_count(), 1);
        assert!(registry.render_group().is_attached());
        assert!(!map.layers().registry(DataSource::Local).render_group().is_attached());

        map.switch().set_data_source(DataSource::Local);
        assert!(!map.unfallatlas().is_visible());
        assert_eq!(
            summarize(registry),
            SourceSummary {
                source: DataSource::Unfallatlas,
                registered: 1,
                visible: 1,
            }
        );
    }
}

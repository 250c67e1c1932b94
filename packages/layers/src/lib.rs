#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Marker registries and visibility.
//!
//! [`MarkerLayers`] owns one [`SourceRegistry`] per data source and the
//! [`Selection`] they all filter against. It is constructed once and
//! passed to every consumer; nothing here is a process-wide global.

pub mod registry;
pub mod render_group;
pub mod selection;
pub mod source_switch;

use std::sync::Arc;

use accident_map_accident_models::{AccidentType, SeverityType};
use accident_map_source_models::DataSource;

pub use registry::{BatchGuard, RegistryError, SourceRegistry};
pub use render_group::RenderGroup;
pub use selection::Selection;
pub use source_switch::{DataSourceSwitch, ListenerId, SourceLayer};

/// All registries plus the shared category selection.
#[derive(Debug)]
pub struct MarkerLayers {
    selection: Arc<Selection>,
    local: Arc<SourceRegistry>,
    unfallatlas: Arc<SourceRegistry>,
}

impl Default for MarkerLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerLayers {
    /// Creates empty registries with every category selected.
    #[must_use]
    pub fn new() -> Self {
        let selection = Arc::new(Selection::new());
        Self {
            local: Arc::new(SourceRegistry::new(DataSource::Local, Arc::clone(&selection))),
            unfallatlas: Arc::new(SourceRegistry::new(
                DataSource::Unfallatlas,
                Arc::clone(&selection),
            )),
            selection,
        }
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The registry of `source`.
    #[must_use]
    pub const fn registry(&self, source: DataSource) -> &Arc<SourceRegistry> {
        match source {
            DataSource::Local => &self.local,
            DataSource::Unfallatlas => &self.unfallatlas,
        }
    }

    /// Enables or disables an accident type and refreshes every source.
    pub fn set_accident_type_selection(&self, accident_type: AccidentType, selected: bool) {
        if self.selection.set_accident_type(accident_type, selected) {
            self.recompute_all();
        }
    }

    /// Enables or disables a severity type and refreshes every source.
    pub fn set_severity_type_selection(&self, severity_type: SeverityType, selected: bool) {
        if self.selection.set_severity_type(severity_type, selected) {
            self.recompute_all();
        }
    }

    /// Rebuilds the visible subset of every source.
    pub fn recompute_all(&self) {
        for source in DataSource::all() {
            self.registry(*source).recompute_visibility();
        }
    }
}

#[cfg(test)]
mod tests {
    use accident_map_accident_models::{LocalSeverity, UnfallatlasSeverity};
    use accident_map_source_models::{Marker, PopupContent, PropertyMap};

    use super::*;

    fn marker(source: DataSource, severity: SeverityType) -> Marker {
        Marker::new(
            source,
            49.0,
            8.4,
            AccidentType::SingleBike,
            severity,
            PopupContent::Eager(PropertyMap::new()),
        )
        .unwrap()
    }

    fn populated() -> MarkerLayers {
        let layers = MarkerLayers::new();
        layers
            .registry(DataSource::Local)
            .register(marker(DataSource::Local, LocalSeverity::Injury.into()))
            .unwrap();
        layers
            .registry(DataSource::Unfallatlas)
            .register(marker(
                DataSource::Unfallatlas,
                UnfallatlasSeverity::Fatality.into(),
            ))
            .unwrap();
        layers
    }

    #[test]
    fn selection_changes_refresh_every_source() {
        let layers = populated();
        layers.set_accident_type_selection(AccidentType::SingleBike, false);
        assert_eq!(layers.registry(DataSource::Local).visible_count(), 0);
        assert_eq!(layers.registry(DataSource::Unfallatlas).visible_count(), 0);

        layers.set_accident_type_selection(AccidentType::SingleBike, true);
        assert_eq!(layers.registry(DataSource::Local).visible_count(), 1);
        assert_eq!(layers.registry(DataSource::Unfallatlas).visible_count(), 1);
    }

    #[test]
    fn severity_toggle_only_affects_its_taxonomy() {
        let layers = populated();
        layers.set_severity_type_selection(UnfallatlasSeverity::Fatality.into(), false);
        assert_eq!(layers.registry(DataSource::Local).visible_count(), 1);
        assert_eq!(layers.registry(DataSource::Unfallatlas).visible_count(), 0);
    }

    #[test]
    fn clearing_one_source_leaves_the_other() {
        let layers = populated();
        layers.registry(DataSource::Unfallatlas).clear();
        assert!(layers.registry(DataSource::Unfallatlas).is_empty());
        assert_eq!(layers.registry(DataSource::Local).len(), 1);
        assert_eq!(layers.registry(DataSource::Local).visible_count(), 1);
    }
}

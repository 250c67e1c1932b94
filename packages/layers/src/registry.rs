//! Per-source marker registry with a derived visible subset.
//!
//! Registered markers are append-only until the registry is cleared.
//! Visibility is derived from the shared [`Selection`]: immediately on
//! registration, or once at the end of a batch.

use std::sync::{Arc, Mutex, PoisonError};

use accident_map_source_models::{DataSource, Marker};

use crate::render_group::RenderGroup;
use crate::selection::Selection;

/// Errors raised by [`SourceRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The marker belongs to a different source.
    #[error("cannot register a {marker} marker in the {registry} registry")]
    WrongSource {
        marker: DataSource,
        registry: DataSource,
    },
}

#[derive(Debug, Default)]
struct Entries {
    markers: Vec<Arc<Marker>>,
    batch_depth: usize,
}

/// Markers of one source and the render group showing the visible ones.
#[derive(Debug)]
pub struct SourceRegistry {
    source: DataSource,
    selection: Arc<Selection>,
    group: Arc<RenderGroup>,
    entries: Mutex<Entries>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new(source: DataSource, selection: Arc<Selection>) -> Self {
        Self {
            source,
            selection,
            group: Arc::new(RenderGroup::new()),
            entries: Mutex::new(Entries::default()),
        }
    }

    #[must_use]
    pub const fn source(&self) -> DataSource {
        self.source
    }

    /// The render group of this source. The same handle is returned for
    /// the registry's whole lifetime.
    #[must_use]
    pub fn render_group(&self) -> Arc<RenderGroup> {
        Arc::clone(&self.group)
    }

    /// Registers a marker. Outside a batch its visibility is decided
    /// immediately against the current selection.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WrongSource`] if the marker belongs to a
    /// different source.
    pub fn register(&self, marker: Marker) -> Result<(), RegistryError> {
        if marker.source() != self.source {
            return Err(RegistryError::WrongSource {
                marker: marker.source(),
                registry: self.source,
            });
        }

        let marker = Arc::new(marker);
        let mut entries = self.lock();
        entries.markers.push(Arc::clone(&marker));

        if entries.batch_depth == 0
            && self
                .selection
                .is_selected(marker.accident_type(), marker.severity_type())
        {
            self.group.push(marker);
        }
        Ok(())
    }

    /// Registers every marker inside one batch.
    ///
    /// # Errors
    ///
    /// Stops at the first marker of a different source; markers before it
    /// stay registered.
    pub fn register_all(
        &self,
        markers: impl IntoIterator<Item = Marker>,
    ) -> Result<usize, RegistryError> {
        let _batch = self.batch();
        let mut count = 0;
        for marker in markers {
            self.register(marker)?;
            count += 1;
        }
        Ok(count)
    }

    /// Opens a batch. Visibility is not updated until the outermost batch
    /// is closed. Batches nest.
    pub fn begin_batch(&self) {
        self.lock().batch_depth += 1;
    }

    /// Closes a batch, recomputing visibility when the outermost batch
    /// closes. Unbalanced calls are ignored.
    pub fn end_batch(&self) {
        let mut entries = self.lock();
        match entries.batch_depth {
            0 => log::warn!("end_batch without begin_batch on the {} registry", self.source),
            1 => {
                entries.batch_depth = 0;
                self.refill(&entries);
            }
            _ => entries.batch_depth -= 1,
        }
    }

    /// Opens a batch that closes when the guard is dropped.
    #[must_use]
    pub fn batch(&self) -> BatchGuard<'_> {
        self.begin_batch();
        BatchGuard { registry: self }
    }

    /// Removes every marker of this source. Other sources are untouched.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.markers.clear();
        self.group.clear();
    }

    /// Rebuilds the visible subset from all registered markers.
    ///
    /// Inside a batch this is deferred to the end of the batch.
    pub fn recompute_visibility(&self) {
        let entries = self.lock();
        if entries.batch_depth == 0 {
            self.refill(&entries);
        }
    }

    fn refill(&self, entries: &Entries) {
        let visible: Vec<Arc<Marker>> = entries
            .markers
            .iter()
            .filter(|marker| {
                self.selection
                    .is_selected(marker.accident_type(), marker.severity_type())
            })
            .cloned()
            .collect();
        log::trace!(
            "{} registry: {} of {} markers visible",
            self.source,
            visible.len(),
            entries.markers.len()
        );
        self.group.replace(visible);
    }

    /// Number of registered markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of currently visible markers.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.group.len()
    }

    /// Shows the render group on the map.
    pub fn attach(&self) {
        self.group.attach();
    }

    /// Hides the render group; registered markers are kept.
    pub fn detach(&self) {
        self.group.detach();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Closes a registry batch on drop.
#[derive(Debug)]
pub struct BatchGuard<'a> {
    registry: &'a SourceRegistry,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.registry.end_batch();
    }
}

#[cfg(test)]
mod tests {
    use accident_map_accident_models::{AccidentType, LocalSeverity, SeverityType};
    use accident_map_source_models::{PopupContent, PropertyMap};

    use super::*;

    fn marker(source: DataSource, accident_type: AccidentType, severity: SeverityType) -> Marker {
        Marker::new(
            source,
            49.0,
            8.4,
            accident_type,
            severity,
            PopupContent::Eager(PropertyMap::new()),
        )
        .unwrap()
    }

    fn local(accident_type: AccidentType) -> Marker {
        marker(DataSource::Local, accident_type, LocalSeverity::Injury.into())
    }

    fn registry() -> (Arc<Selection>, SourceRegistry) {
        let selection = Arc::new(Selection::new());
        let registry = SourceRegistry::new(DataSource::Local, Arc::clone(&selection));
        (selection, registry)
    }

    #[test]
    fn registration_outside_batch_is_visible_immediately() {
        let (selection, registry) = registry();
        selection.set_accident_type(AccidentType::BikeOnly, false);
        registry.register(local(AccidentType::SingleBike)).unwrap();
        registry.register(local(AccidentType::BikeOnly)).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.visible_count(), 1);
    }

    #[test]
    fn batch_defers_visibility_to_one_refill() {
        let (_selection, registry) = registry();
        let group = registry.render_group();
        let before = group.revision();
        {
            let _batch = registry.batch();
            for _ in 0..100 {
                registry.register(local(AccidentType::SingleBike)).unwrap();
            }
            assert_eq!(registry.visible_count(), 0);
        }
        assert_eq!(registry.visible_count(), 100);
        assert_eq!(group.revision(), before + 1);
    }

    #[test]
    fn nested_batches_refill_once() {
        let (_selection, registry) = registry();
        registry.begin_batch();
        registry.begin_batch();
        registry.register(local(AccidentType::SingleBike)).unwrap();
        registry.end_batch();
        assert_eq!(registry.visible_count(), 0);
        registry.end_batch();
        assert_eq!(registry.visible_count(), 1);
        registry.end_batch();
        assert_eq!(registry.visible_count(), 1);
    }

    #[test]
    fn toggling_a_category_restores_the_same_markers() {
        let (selection, registry) = registry();
        for accident_type in AccidentType::all() {
            registry.register(local(*accident_type)).unwrap();
        }
        let before = registry.render_group().snapshot();

        selection.set_accident_type(AccidentType::SingleBike, false);
        registry.recompute_visibility();
        assert_eq!(registry.visible_count(), before.len() - 1);

        selection.set_accident_type(AccidentType::SingleBike, true);
        registry.recompute_visibility();
        let after = registry.render_group().snapshot();
        assert_eq!(before.len(), after.len());
        assert!(before.iter().zip(&after).all(|(a, b)| Arc::ptr_eq(a, b)));
    }

    #[test]
    fn render_group_handle_is_stable() {
        let (_selection, registry) = registry();
        let group = registry.render_group();
        registry.register(local(AccidentType::SingleBike)).unwrap();
        registry.clear();
        registry.register(local(AccidentType::BikeOnly)).unwrap();
        assert!(Arc::ptr_eq(&group, &registry.render_group()));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn rejects_markers_of_other_sources() {
        let (_selection, registry) = registry();
        let foreign = marker(
            DataSource::Unfallatlas,
            AccidentType::SingleBike,
            accident_map_accident_models::UnfallatlasSeverity::Fatality.into(),
        );
        assert_eq!(
            registry.register(foreign),
            Err(RegistryError::WrongSource {
                marker: DataSource::Unfallatlas,
                registry: DataSource::Local,
            })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn register_all_uses_one_batch() {
        let (_selection, registry) = registry();
        let group = registry.render_group();
        let before = group.revision();
        let count = registry
            .register_all((0..10).map(|_| local(AccidentType::SingleBike)))
            .unwrap();
        assert_eq!(count, 10);
        assert_eq!(group.len(), 10);
        assert_eq!(group.revision(), before + 1);
    }
}

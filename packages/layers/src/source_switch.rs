//! The active data source.
//!
//! Exactly one source is shown at a time. Switching hides the previous
//! source's layer, shows the new one, and notifies subscribers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use accident_map_source_models::DataSource;

use crate::registry::SourceRegistry;

/// Something that can be shown or hidden when its source becomes active.
pub trait SourceLayer: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// A static source is shown by attaching its render group.
impl SourceLayer for SourceRegistry {
    fn show(&self) {
        self.attach();
    }

    fn hide(&self) {
        self.detach();
    }
}

/// Callback invoked with the newly active source.
pub type Listener = Arc<dyn Fn(DataSource) + Send + Sync>;

/// Handle returned by [`DataSourceSwitch::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Tracks the active source and drives layer visibility.
pub struct DataSourceSwitch {
    active: Mutex<DataSource>,
    layers: BTreeMap<DataSource, Arc<dyn SourceLayer>>,
    listeners: Mutex<BTreeMap<ListenerId, Listener>>,
    next_listener: AtomicU64,
}

impl std::fmt::Debug for DataSourceSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceSwitch")
            .field("active", &self.active())
            .field("layers", &self.layers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DataSourceSwitch {
    /// Creates a switch with [`DataSource::Local`] active. Nothing is shown
    /// until [`Self::show_active`] is called.
    #[must_use]
    pub fn new(layers: impl IntoIterator<Item = (DataSource, Arc<dyn SourceLayer>)>) -> Self {
        Self {
            active: Mutex::new(DataSource::Local),
            layers: layers.into_iter().collect(),
            listeners: Mutex::new(BTreeMap::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn active(&self) -> DataSource {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shows the layer of the active source.
    pub fn show_active(&self) {
        if let Some(layer) = self.layers.get(&self.active()) {
            layer.show();
        }
    }

    /// Makes `source` active. Does nothing if it already is.
    pub fn set_data_source(&self, source: DataSource) {
        let previous = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if *active == source {
                return;
            }
            std::mem::replace(&mut *active, source)
        };

        if let Some(layer) = self.layers.get(&previous) {
            layer.hide();
        }
        if let Some(layer) = self.layers.get(&source) {
            layer.show();
        } else {
            log::warn!("No layer registered for data source {source}");
        }
        log::info!("Switched data source from {previous} to {source}");

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(source);
        }
    }

    /// Registers a change listener.
    pub fn subscribe(&self, listener: impl Fn(DataSource) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }
}

//! Render groups: the visible marker sets handed to the map.
//!
//! A [`RenderGroup`] is created once per source and never replaced. Its
//! membership is refilled in place, so a renderer holding the `Arc` keeps
//! seeing the current markers across reloads and selection changes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use accident_map_source_models::Marker;

/// A stable handle to a set of displayed markers.
#[derive(Debug, Default)]
pub struct RenderGroup {
    members: RwLock<Vec<Arc<Marker>>>,
    attached: AtomicBool,
    revision: AtomicU64,
}

impl RenderGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the group as displayed on the map.
    pub fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    /// Removes the group from display. Membership is kept.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Replaces the whole membership in one step. Readers never observe an
    /// intermediate empty state.
    pub fn replace(&self, markers: Vec<Arc<Marker>>) {
        *self.members.write().unwrap_or_else(PoisonError::into_inner) = markers;
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Adds one marker.
    pub fn push(&self, marker: Arc<Marker>) {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(marker);
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Removes every marker.
    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// The current members.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Marker>> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of membership changes so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

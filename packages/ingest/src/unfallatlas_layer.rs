//! Load orchestration for the yearly Unfallatlas source.
//!
//! [`UnfallatlasLayer`] owns the requested year set and makes sure at most
//! one load runs at a time. A request that arrives while a load is in
//! flight only marks the load as pending; when the running attempt
//! finishes it immediately starts another one for whatever is requested
//! at that point. Requests that land on an already loaded year set are
//! no-ops, so hiding and re-showing the layer never re-fetches.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use accident_map_ingest_models::{LoadOutcome, LoadPhase, UnfallatlasLoadResult};
use accident_map_layers::{SourceLayer, SourceRegistry};
use accident_map_source::SourceError;
use accident_map_source::catalog::UnfallatlasCatalog;
use accident_map_source::progress::{ProgressCallback, null_progress};
use accident_map_source::unfallatlas::{YearBatch, YearParser};
use accident_map_source_models::{Fingerprint, YearSet};
use tokio::sync::{OnceCell, watch};

use crate::IngestError;

#[derive(Debug, Default)]
struct LoadState {
    requested: YearSet,
    loaded: Option<Fingerprint>,
    visible: bool,
    initialized: bool,
    last_outcome: Option<LoadOutcome>,
}

struct Inner {
    catalog: Arc<UnfallatlasCatalog>,
    parser: YearParser,
    registry: Arc<SourceRegistry>,
    phase: watch::Sender<LoadPhase>,
    init: OnceCell<()>,
    state: Mutex<LoadState>,
    progress: Mutex<Arc<dyn ProgressCallback>>,
}

/// The Unfallatlas map layer and its load state.
///
/// Cloning is cheap; every clone drives the same layer.
#[derive(Clone)]
pub struct UnfallatlasLayer {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for UnfallatlasLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("UnfallatlasLayer")
            .field("phase", &self.phase())
            .field("requested", &state.requested)
            .field("loaded", &state.loaded)
            .field("visible", &state.visible)
            .finish_non_exhaustive()
    }
}

impl UnfallatlasLayer {
    /// Creates a hidden layer with no years requested. The available years
    /// are adopted the first time the layer is shown.
    #[must_use]
    pub fn new(
        catalog: Arc<UnfallatlasCatalog>,
        parser: YearParser,
        registry: Arc<SourceRegistry>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                parser,
                registry,
                phase: watch::Sender::new(LoadPhase::Idle),
                init: OnceCell::new(),
                state: Mutex::new(LoadState::default()),
                progress: Mutex::new(null_progress()),
            }),
        }
    }

    /// Starts with `years` requested instead of the available years.
    #[must_use]
    pub fn with_years(self, years: YearSet) -> Self {
        {
            let mut state = self.inner.state();
            state.requested = years;
            state.initialized = true;
        }
        self
    }

    /// Reports the years of each load attempt to `progress`.
    pub fn set_progress(&self, progress: Arc<dyn ProgressCallback>) {
        *self
            .inner
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = progress;
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.inner.registry
    }

    /// Years that can be requested: the manifest's years, or the
    /// configured defaults.
    pub async fn available_years(&self) -> YearSet {
        self.inner.catalog.available_years().await
    }

    /// The currently requested years.
    #[must_use]
    pub fn selected_years(&self) -> YearSet {
        self.inner.state().requested.clone()
    }

    /// Fingerprint of the year set whose markers are registered, if any.
    #[must_use]
    pub fn loaded_fingerprint(&self) -> Option<Fingerprint> {
        self.inner.state().loaded.clone()
    }

    /// Outcome of the most recent load attempt.
    #[must_use]
    pub fn last_outcome(&self) -> Option<LoadOutcome> {
        self.inner.state().last_outcome.clone()
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        *self.inner.phase.borrow()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.inner.state().visible
    }

    /// Replaces the requested year set and reloads if the layer is visible.
    ///
    /// Does nothing when the normalized set equals the current request.
    ///
    /// # Panics
    ///
    /// Panics if a load has to be started outside a Tokio runtime.
    pub fn set_years(&self, years: impl IntoIterator<Item = i32>) {
        let years = YearSet::new(years);
        let visible = {
            let mut state = self.inner.state();
            if state.requested == years {
                return;
            }
            log::debug!("Requested Unfallatlas years: {}", years.fingerprint());
            state.requested = years;
            state.initialized = true;
            state.visible
        };
        if visible {
            self.trigger_load();
        }
    }

    /// Adds or removes a single year.
    ///
    /// # Panics
    ///
    /// Panics if a load has to be started outside a Tokio runtime.
    pub fn set_year_selection(&self, year: i32, selected: bool) {
        let years = self.selected_years().toggled(year, selected);
        self.set_years(years.as_slice().iter().copied());
    }

    /// Starts a load, or marks one as pending if a load is in flight.
    /// Does nothing while the layer is hidden.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn trigger_load(&self) {
        if !self.is_visible() {
            return;
        }

        let mut start = false;
        self.inner.phase.send_if_modified(|phase| {
            let next = match *phase {
                LoadPhase::Idle => {
                    start = true;
                    LoadPhase::Loading
                }
                LoadPhase::Loading | LoadPhase::LoadingWithPending => {
                    LoadPhase::LoadingWithPending
                }
            };
            let changed = next != *phase;
            *phase = next;
            changed
        });

        if start {
            tokio::spawn(Arc::clone(&self.inner).run());
        }
    }

    /// Waits until no load is in flight or pending.
    pub async fn wait_until_idle(&self) {
        let mut phase = self.inner.phase.subscribe();
        if phase.wait_for(|phase| *phase == LoadPhase::Idle).await.is_err() {
            log::debug!("Unfallatlas load phase channel closed");
        }
    }
}

impl SourceLayer for UnfallatlasLayer {
    /// Attaches the render group and loads the requested years unless they
    /// are already loaded.
    fn show(&self) {
        self.inner.state().visible = true;
        self.inner.registry.attach();
        self.trigger_load();
    }

    /// Detaches the render group and drops a pending reload. A load in
    /// flight still finishes and populates the registry.
    fn hide(&self) {
        self.inner.state().visible = false;
        self.inner.registry.detach();
        self.inner.phase.send_if_modified(|phase| {
            if *phase == LoadPhase::LoadingWithPending {
                *phase = LoadPhase::Loading;
                true
            } else {
                false
            }
        });
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(self: Arc<Self>) {
        loop {
            match self.attempt().await {
                Ok(outcome) => self.state().last_outcome = Some(outcome),
                Err(e) => {
                    log::error!("Failed to load Unfallatlas data: {e}");
                    self.registry.clear();
                    self.state().loaded = None;
                }
            }

            let mut again = false;
            self.phase.send_modify(|phase| {
                *phase = if *phase == LoadPhase::LoadingWithPending {
                    again = true;
                    LoadPhase::Loading
                } else {
                    LoadPhase::Idle
                };
            });
            if !again {
                break;
            }
        }
    }

    /// Adopts the available years as the initial request, once.
    async fn initialize(&self) {
        if self.state().initialized {
            return;
        }
        let available = self.catalog.available_years().await;
        let mut state = self.state();
        if !state.initialized && state.requested.is_empty() {
            log::debug!("Adopting available Unfallatlas years: {}", available.fingerprint());
            state.requested = available;
        }
        state.initialized = true;
    }

    async fn attempt(&self) -> Result<LoadOutcome, IngestError> {
        self.init.get_or_init(|| self.initialize()).await;

        let (years, fingerprint) = {
            let mut state = self.state();
            let fingerprint = state.requested.fingerprint();
            if state.loaded.as_ref() == Some(&fingerprint) {
                return Ok(LoadOutcome::Unchanged { fingerprint });
            }
            state.loaded = None;
            (state.requested.clone(), fingerprint)
        };

        self.registry.clear();

        if years.is_empty() {
            self.state().loaded = Some(fingerprint);
            log::info!("No Unfallatlas years requested");
            return Ok(LoadOutcome::Cleared);
        }

        log::info!("Loading Unfallatlas years {fingerprint}");
        let progress = Arc::clone(&self.progress.lock().unwrap_or_else(PoisonError::into_inner));
        progress.set_total(years.len() as u64);
        progress.set_message(format!("Unfallatlas {fingerprint}"));

        let batches = futures::future::join_all(years.as_slice().iter().map(|&year| {
            let progress = Arc::clone(&progress);
            async move {
                let batch = self.load_year(year).await;
                progress.inc(1);
                batch
            }
        }))
        .await;

        let mut result = UnfallatlasLoadResult::default();
        {
            let _batch = self.registry.batch();
            for (year, batch) in years.as_slice().iter().zip(batches) {
                match batch {
                    Ok(batch) => {
                        result.loaded_years += 1;
                        result.marker_count += self.registry.register_all(batch.markers)?;
                    }
                    Err(e) => {
                        log::warn!("Failed to load Unfallatlas {year}: {e}");
                        result.failed_years += 1;
                    }
                }
            }
        }

        self.state().loaded = Some(fingerprint.clone());
        progress.finish(format!(
            "Unfallatlas {fingerprint}: {} markers",
            result.marker_count
        ));

        if result.loaded_years == 0 {
            log::warn!("Unfallatlas: no files loaded for {fingerprint}");
        } else if result.marker_count == 0 {
            log::warn!("Unfallatlas: no mappable markers in {fingerprint}");
        } else {
            log::info!(
                "Unfallatlas: {} markers from {} years ({} failed)",
                result.marker_count,
                result.loaded_years,
                result.failed_years
            );
        }

        Ok(LoadOutcome::Loaded {
            fingerprint,
            result,
        })
    }

    async fn load_year(&self, year: i32) -> Result<YearBatch, SourceError> {
        let text = self.catalog.fetch_year(year).await?;
        self.parser.parse(&text, year).await
    }
}

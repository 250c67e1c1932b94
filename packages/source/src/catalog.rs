//! Year catalog of the Unfallatlas exports.
//!
//! The manifest is fetched at most once per catalog. Concurrent callers
//! share the same in-flight fetch, and a missing or unreadable manifest
//! falls back to the configured defaults instead of failing.

use std::sync::Arc;

use accident_map_source_models::{Manifest, YearSet};
use tokio::sync::OnceCell;

use crate::SourceError;
use crate::source_def::YearlyCsvConfig;
use crate::transport::Transport;

/// Resolves available years and year files through a [`Transport`].
pub struct UnfallatlasCatalog {
    transport: Arc<dyn Transport>,
    config: YearlyCsvConfig,
    manifest: OnceCell<Manifest>,
}

impl UnfallatlasCatalog {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: YearlyCsvConfig) -> Self {
        Self {
            transport,
            config,
            manifest: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &YearlyCsvConfig {
        &self.config
    }

    /// The normalized manifest, empty when none could be loaded.
    pub async fn manifest(&self) -> &Manifest {
        self.manifest.get_or_init(|| self.load_manifest()).await
    }

    async fn load_manifest(&self) -> Manifest {
        let path = &self.config.manifest_path;
        let document = match self.transport.fetch_text(path).await {
            Ok(Some(text)) => {
                serde_json::from_str::<serde_json::Value>(&text).map_err(SourceError::from)
            }
            Ok(None) => {
                log::debug!("No Unfallatlas manifest at {path}");
                return Manifest::default();
            }
            Err(e) => Err(e),
        };

        match document {
            Ok(document) => {
                let manifest = Manifest::from_json(&document);
                log::debug!(
                    "Loaded Unfallatlas manifest: {} years, {} with explicit paths",
                    manifest.years.len(),
                    manifest.paths_by_year.len()
                );
                manifest
            }
            Err(e) => {
                log::warn!("Could not load Unfallatlas manifest, falling back to defaults: {e}");
                Manifest::default()
            }
        }
    }

    /// Years listed by the manifest, or the configured defaults when the
    /// manifest lists none.
    pub async fn available_years(&self) -> YearSet {
        let manifest = self.manifest().await;
        if manifest.years.is_empty() {
            self.config.default_year_set()
        } else {
            manifest.years.clone()
        }
    }

    /// Paths to try for `year`, in order: the manifest's paths for that
    /// year if it lists any, the configured templates otherwise.
    pub async fn candidate_paths(&self, year: i32) -> Vec<String> {
        match self.manifest().await.paths_for(year) {
            Some(paths) => paths.to_vec(),
            None => self.config.template_paths(year),
        }
    }

    /// Fetches the text of the first candidate path that exists.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] listing every attempted path when
    /// no candidate could be fetched.
    pub async fn fetch_year(&self, year: i32) -> Result<String, SourceError> {
        let tried = self.candidate_paths(year).await;

        for path in &tried {
            match self.transport.fetch_text(path).await {
                Ok(Some(text)) => {
                    log::debug!("Fetched Unfallatlas {year} from {path}");
                    return Ok(text);
                }
                Ok(None) => {}
                Err(e) => log::debug!("Fetching {path} failed: {e}"),
            }
        }

        Err(SourceError::NotFound { year, tried })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    fn config() -> YearlyCsvConfig {
        YearlyCsvConfig {
            manifest_path: "manifest.json".to_string(),
            default_years: vec![2021, 2020],
            path_templates: vec!["a/{year}.csv".to_string(), "b/{year}.csv".to_string()],
            delimiter: ';',
            yield_interval: 5000,
        }
    }

    fn catalog(transport: &Arc<MemoryTransport>) -> UnfallatlasCatalog {
        UnfallatlasCatalog::new(Arc::clone(transport) as Arc<dyn Transport>, config())
    }

    #[tokio::test]
    async fn falls_back_to_default_years() {
        let transport = Arc::new(MemoryTransport::new());
        let catalog = catalog(&transport);
        assert_eq!(catalog.available_years().await.as_slice(), &[2020, 2021]);
    }

    #[tokio::test]
    async fn malformed_manifest_falls_back() {
        let transport = Arc::new(MemoryTransport::new().with_file("manifest.json", "{not json"));
        let catalog = catalog(&transport);
        assert_eq!(catalog.available_years().await.as_slice(), &[2020, 2021]);
    }

    #[tokio::test]
    async fn manifest_years_and_paths_win() {
        let transport = Arc::new(
            MemoryTransport::new()
                .with_file(
                    "manifest.json",
                    r#"{"years":[2019],"pathsByYear":{"2023":["x/2023.csv"]}}"#,
                )
                .with_file("x/2023.csv", "2023 data")
                .with_file("b/2019.csv", "2019 data"),
        );
        let catalog = catalog(&transport);
        assert_eq!(catalog.available_years().await.as_slice(), &[2019, 2023]);
        assert_eq!(catalog.candidate_paths(2023).await, vec!["x/2023.csv".to_string()]);
        assert_eq!(catalog.fetch_year(2023).await.unwrap(), "2023 data");
        assert_eq!(catalog.fetch_year(2019).await.unwrap(), "2019 data");
    }

    #[tokio::test]
    async fn manifest_is_fetched_once() {
        let transport = Arc::new(MemoryTransport::new());
        let catalog = catalog(&transport);
        let (a, b) = tokio::join!(catalog.available_years(), catalog.available_years());
        assert_eq!(a, b);
        catalog.candidate_paths(2020).await;
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn missing_year_lists_tried_paths() {
        let transport = Arc::new(MemoryTransport::new());
        let catalog = catalog(&transport);
        let err = catalog.fetch_year(2018).await.unwrap_err();
        match err {
            SourceError::NotFound { year, tried } => {
                assert_eq!(year, 2018);
                assert_eq!(tried, vec!["a/2018.csv".to_string(), "b/2018.csv".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

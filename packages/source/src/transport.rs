//! Text transports for data files.
//!
//! A [`Transport`] fetches the full text behind a relative path. A missing
//! resource is `Ok(None)` rather than an error, so candidate paths can be
//! tried one after another.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::SourceError;
use crate::http;

/// Fetches text resources by relative path.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches the resource at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] for failures other than "not found".
    async fn fetch_text(&self, path: &str) -> Result<Option<String>, SourceError>;

    /// Human-readable location for log messages.
    fn describe(&self) -> String;
}

/// Picks an HTTP transport for `http(s)://` locations and a filesystem
/// transport otherwise.
#[must_use]
pub fn from_location(location: &str) -> Box<dyn Transport> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpTransport::new(location))
    } else {
        Box::new(FsTransport::new(location))
    }
}

/// Fetches files over HTTP relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Uses an existing client, e.g. one with custom timeouts.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, path: &str) -> Result<Option<String>, SourceError> {
        let url = self.url_for(path);
        log::debug!("GET {url}");
        http::send_text(self.client.get(&url)).await
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Reads files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsTransport {
    root: PathBuf,
}

impl FsTransport {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Transport for FsTransport {
    async fn fetch_text(&self, path: &str) -> Result<Option<String>, SourceError> {
        let full_path = self.root.join(path.trim_start_matches('/'));
        match tokio::fs::read_to_string(&full_path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Serves canned text from memory and counts fetches.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    files: Mutex<BTreeMap<String, String>>,
    fetches: AtomicUsize,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the resource at `path`.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        self.files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(path.into(), text.into());
    }

    /// Number of `fetch_text` calls so far, including misses.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch_text(&self, path: &str) -> Result<Option<String>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .cloned())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_urls() {
        let transport = HttpTransport::new("https://example.org/data/");
        assert_eq!(
            transport.url_for("/unfallatlas/2022.csv"),
            "https://example.org/data/unfallatlas/2022.csv"
        );
    }

    #[test]
    fn picks_transport_by_location() {
        assert_eq!(from_location("https://example.org").describe(), "https://example.org");
        assert_eq!(from_location("./data").describe(), "./data");
    }

    #[tokio::test]
    async fn filesystem_missing_file_is_none() {
        let transport = FsTransport::new(std::env::temp_dir());
        let missing = transport
            .fetch_text("accident-map-does-not-exist.csv")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn memory_transport_counts_fetches() {
        let transport = MemoryTransport::new().with_file("a.csv", "x");
        assert_eq!(transport.fetch_text("a.csv").await.unwrap().as_deref(), Some("x"));
        assert_eq!(transport.fetch_text("b.csv").await.unwrap(), None);
        assert_eq!(transport.fetch_count(), 2);
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident record ingestion.
//!
//! Turns the raw inputs of both data sources into classified
//! [`Marker`](accident_map_source_models::Marker)s:
//!
//! * [`schema`] maps the Unfallatlas header row onto the columns the
//!   classifier needs.
//! * [`classify`] holds the ordered rule tables for accident types and
//!   severities.
//! * [`marker`] builds markers from parsed rows and from point features.
//! * [`unfallatlas`] parses a whole yearly export, cooperatively yielding.
//! * [`catalog`] resolves available years and candidate file paths through
//!   a [`transport::Transport`].
//! * [`local`] reads the prebuilt feature container.

pub mod catalog;
pub mod classify;
pub mod http;
pub mod local;
pub mod marker;
pub mod parsing;
pub mod popup;
pub mod progress;
pub mod registry;
pub mod schema;
pub mod source_def;
pub mod transport;
pub mod unfallatlas;

use accident_map_delimited::ParseError;

pub use schema::SchemaError;

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedded source configuration is invalid.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Delimited text could not be read.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The header row does not describe a usable export.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// None of the candidate paths for a year exist.
    #[error("No data file found for {year} (tried: {})", tried.join(", "))]
    NotFound {
        /// The requested year.
        year: i32,
        /// Every path that was attempted, in order.
        tried: Vec<String>,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Data normalization error.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },
}

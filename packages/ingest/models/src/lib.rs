#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Load phases and load result types.

use accident_map_source_models::{DataSource, Fingerprint};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// State of a source's load orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadPhase {
    /// No load in flight.
    #[default]
    Idle,
    /// One load in flight.
    Loading,
    /// One load in flight and another requested; the next attempt starts
    /// as soon as the current one finishes.
    LoadingWithPending,
}

impl LoadPhase {
    #[must_use]
    pub const fn is_loading(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Aggregate outcome of one Unfallatlas load attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfallatlasLoadResult {
    /// Years whose file was fetched and parsed.
    pub loaded_years: usize,
    /// Years whose fetch or parse failed.
    pub failed_years: usize,
    /// Markers registered across all loaded years.
    pub marker_count: usize,
}

/// What a load attempt did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadOutcome {
    /// The requested years were already loaded.
    Unchanged {
        fingerprint: Fingerprint,
    },
    /// The registry was cleared because no years are requested.
    Cleared,
    /// The requested years were fetched and registered.
    Loaded {
        fingerprint: Fingerprint,
        result: UnfallatlasLoadResult,
    },
}

/// Outcome of loading the local container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalLoadResult {
    /// Markers registered.
    pub marker_count: usize,
    /// Features without usable point geometry.
    pub skipped: u64,
}

/// Registered and visible marker counts of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub source: DataSource,
    pub registered: usize,
    pub visible: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_not_loading() {
        assert!(!LoadPhase::Idle.is_loading());
        assert!(LoadPhase::Loading.is_loading());
        assert!(LoadPhase::LoadingWithPending.is_loading());
        assert_eq!(LoadPhase::default(), LoadPhase::Idle);
    }

    #[test]
    fn load_result_serializes_camel_case() {
        let result = UnfallatlasLoadResult {
            loaded_years: 1,
            failed_years: 1,
            marker_count: 10,
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            serde_json::json!({ "loadedYears": 1, "failedYears": 1, "markerCount": 10 })
        );
    }

    #[test]
    fn phase_display() {
        assert_eq!(LoadPhase::LoadingWithPending.to_string(), "LOADING_WITH_PENDING");
    }
}

//! Config-driven data source definitions.
//!
//! [`SourceDefinition`] captures everything unique about a data source in a
//! serializable config struct: display name and how its raw data is
//! located.

use accident_map_source_models::{DataSource, YearSet};
use serde::Deserialize;

use crate::SourceError;
use crate::unfallatlas::{DEFAULT_YIELD_INTERVAL, YearParser};

/// Placeholder replaced by the year in [`FetcherConfig::YearlyCsv`] path
/// templates.
pub const YEAR_PLACEHOLDER: &str = "{year}";

// ── Top-level source definition ──────────────────────────────────────────

/// A complete, config-driven data source definition.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDefinition {
    /// Which source this configures.
    pub id: DataSource,
    /// Human-readable name, shown in popups.
    pub name: String,
    /// How to locate raw data.
    pub fetcher: FetcherConfig,
}

impl SourceDefinition {
    /// Returns the yearly CSV settings, if this source uses them.
    #[must_use]
    pub const fn yearly_csv(&self) -> Option<&YearlyCsvConfig> {
        match &self.fetcher {
            FetcherConfig::YearlyCsv(config) => Some(config),
            FetcherConfig::Container { .. } => None,
        }
    }
}

// ── Fetcher config ───────────────────────────────────────────────────────

/// Where the raw data of a source lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetcherConfig {
    /// A prebuilt geospatial container with point features.
    Container {
        /// Path of the container file.
        path: String,
        /// Layer holding the accident features.
        layer: String,
    },
    /// One delimited export per year.
    YearlyCsv(YearlyCsvConfig),
}

/// Settings of yearly delimited exports.
#[derive(Debug, Clone, Deserialize)]
pub struct YearlyCsvConfig {
    /// Path of the optional manifest listing years and files.
    pub manifest_path: String,
    /// Years offered when no manifest is available.
    pub default_years: Vec<i32>,
    /// Candidate paths containing [`YEAR_PLACEHOLDER`], tried in order
    /// for years the manifest lists no paths for.
    pub path_templates: Vec<String>,
    /// Field delimiter; a single character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Rows parsed between cooperative yields.
    #[serde(default = "default_yield_interval")]
    pub yield_interval: usize,
}

const fn default_delimiter() -> char {
    ';'
}

const fn default_yield_interval() -> usize {
    DEFAULT_YIELD_INTERVAL
}

impl YearlyCsvConfig {
    /// The fallback year list, normalized.
    #[must_use]
    pub fn default_year_set(&self) -> YearSet {
        YearSet::new(self.default_years.iter().copied())
    }

    /// Template paths for `year`, in order.
    #[must_use]
    pub fn template_paths(&self, year: i32) -> Vec<String> {
        let year = year.to_string();
        self.path_templates
            .iter()
            .map(|template| template.replace(YEAR_PLACEHOLDER, &year))
            .collect()
    }

    /// A row parser configured for these exports.
    #[must_use]
    pub fn parser(&self, source_name: &str) -> YearParser {
        YearParser::new(source_name)
            .with_delimiter(self.delimiter)
            .with_yield_interval(self.yield_interval)
    }
}

/// Parses a TOML source definition.
///
/// # Errors
///
/// Returns [`SourceError::Toml`] if the document is malformed.
pub fn parse_source_toml(toml: &str) -> Result<SourceDefinition, SourceError> {
    Ok(toml::de::from_str(toml)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEARLY: &str = r#"
id = "unfallatlas"
name = "Test"

[fetcher]
type = "yearly_csv"
manifest_path = "manifest.json"
default_years = [2022, 2021, 2022]
path_templates = ["a/{year}.csv", "b-{year}-{year}.csv"]
"#;

    #[test]
    fn parses_yearly_definition_with_defaults() {
        let definition = parse_source_toml(YEARLY).unwrap();
        assert_eq!(definition.id, DataSource::Unfallatlas);
        let config = definition.yearly_csv().unwrap();
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.yield_interval, DEFAULT_YIELD_INTERVAL);
        assert_eq!(config.default_year_set().as_slice(), &[2021, 2022]);
        assert_eq!(
            config.template_paths(2020),
            vec!["a/2020.csv".to_string(), "b-2020-2020.csv".to_string()]
        );
    }

    #[test]
    fn rejects_unknown_fetcher() {
        let toml = YEARLY.replace("yearly_csv", "ftp");
        assert!(matches!(
            parse_source_toml(&toml),
            Err(SourceError::Toml(_))
        ));
    }
}

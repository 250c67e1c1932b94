//! Source registry: loads source definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`].

use accident_map_source_models::DataSource;

use crate::source_def::{SourceDefinition, parse_source_toml};

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("local", include_str!("../sources/local.toml")),
    ("unfallatlas", include_str!("../sources/unfallatlas.toml")),
];

/// Returns all configured source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is covered by the tests below).
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the definition of `source`.
///
/// # Panics
///
/// Panics if the embedded configs do not define `source`.
#[must_use]
pub fn source(source: DataSource) -> SourceDefinition {
    all_sources()
        .into_iter()
        .find(|definition| definition.id == source)
        .unwrap_or_else(|| panic!("No embedded config for {source}"))
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data source identifiers, marker records, year sets, and the Unfallatlas
//! manifest.
//!
//! Every ingested accident ends up as a [`Marker`] tagged with the
//! [`DataSource`] it came from. Markers are classified once at creation
//! time; their popup content may be built eagerly or deferred until the
//! marker is actually opened.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use accident_map_accident_models::{AccidentType, SeverityType};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Arbitrary popup properties, in insertion (display) order.
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

/// Deferred popup builder, invoked only when the marker is opened.
pub type PopupProducer = Box<dyn Fn() -> PropertyMap + Send + Sync>;

/// The origin of a marker.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataSource {
    /// Prebuilt geospatial container shipped with the application
    Local,
    /// Yearly open-data exports of the Unfallatlas
    Unfallatlas,
}

impl DataSource {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Local, Self::Unfallatlas]
    }
}

/// Popup content of a marker.
pub enum PopupContent {
    /// Properties that were already available when the marker was built.
    Eager(PropertyMap),
    /// Properties built on demand.
    Lazy(PopupProducer),
}

impl PopupContent {
    /// Returns the popup properties, invoking the producer for lazy content.
    #[must_use]
    pub fn resolve(&self) -> Cow<'_, PropertyMap> {
        match self {
            Self::Eager(properties) => Cow::Borrowed(properties),
            Self::Lazy(producer) => Cow::Owned(producer()),
        }
    }

    /// Whether the content is deferred.
    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }
}

impl std::fmt::Debug for PopupContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eager(properties) => f.debug_tuple("Eager").field(properties).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Circle style of a rendered marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    /// Stroke colour.
    pub color: &'static str,
    /// Stroke width in pixels.
    pub weight: u8,
    /// Circle radius in pixels.
    pub radius: u8,
    /// Fill colour.
    pub fill_color: &'static str,
    /// Stroke opacity.
    pub opacity: f32,
    /// Fill opacity.
    pub fill_opacity: f32,
}

/// A classified map marker.
///
/// Coordinates are always finite; classification is fixed at construction.
#[derive(Debug)]
pub struct Marker {
    source: DataSource,
    latitude: f64,
    longitude: f64,
    accident_type: AccidentType,
    severity_type: SeverityType,
    popup: PopupContent,
}

impl Marker {
    /// Builds a marker, returning `None` if either coordinate is not finite.
    #[must_use]
    pub fn new(
        source: DataSource,
        latitude: f64,
        longitude: f64,
        accident_type: AccidentType,
        severity_type: SeverityType,
        popup: PopupContent,
    ) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        Some(Self {
            source,
            latitude,
            longitude,
            accident_type,
            severity_type,
            popup,
        })
    }

    #[must_use]
    pub const fn source(&self) -> DataSource {
        self.source
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub const fn accident_type(&self) -> AccidentType {
        self.accident_type
    }

    #[must_use]
    pub const fn severity_type(&self) -> SeverityType {
        self.severity_type
    }

    #[must_use]
    pub const fn popup(&self) -> &PopupContent {
        &self.popup
    }

    /// Popup properties; lazy content is built on each call.
    #[must_use]
    pub fn popup_properties(&self) -> Cow<'_, PropertyMap> {
        self.popup.resolve()
    }

    /// Circle style derived from the marker's classification.
    #[must_use]
    pub const fn style(&self) -> MarkerStyle {
        MarkerStyle {
            color: "#000000",
            weight: 1,
            radius: self.severity_type.radius(),
            fill_color: self.accident_type.color(),
            opacity: 1.0,
            fill_opacity: 0.9,
        }
    }
}

/// Canonical string of a normalized [`YearSet`], e.g. `"2021,2022"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deduplicated, ascending set of data years.
///
/// Deserialized input is normalized the same way as [`YearSet::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<i32>")]
pub struct YearSet(Vec<i32>);

impl YearSet {
    /// Normalizes the given years (dedup, ascending).
    #[must_use]
    pub fn new(years: impl IntoIterator<Item = i32>) -> Self {
        let unique: BTreeSet<i32> = years.into_iter().collect();
        Self(unique.into_iter().collect())
    }

    /// Normalizes loosely typed JSON input, keeping only whole numbers
    /// that fit an `i32`. `2021.0` counts as 2021.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        let Some(entries) = value.as_array() else {
            return Self::default();
        };
        Self::new(entries.iter().filter_map(json_year))
    }

    /// Parses a comma-separated list, ignoring entries that are not
    /// integers.
    #[must_use]
    pub fn parse_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter_map(|year| year.parse::<i32>().ok()),
        )
    }

    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        self.0.binary_search(&year).is_ok()
    }

    /// Returns a copy with `year` added or removed.
    #[must_use]
    pub fn toggled(&self, year: i32, selected: bool) -> Self {
        let mut years: BTreeSet<i32> = self.0.iter().copied().collect();
        if selected {
            years.insert(year);
        } else {
            years.remove(&year);
        }
        Self(years.into_iter().collect())
    }

    /// Canonical fingerprint used to detect unchanged requests.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(
            self.0
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn json_year(value: &serde_json::Value) -> Option<i32> {
    if let Some(year) = value.as_i64() {
        return i32::try_from(year).ok();
    }
    let year = value.as_f64()?;
    (year.fract() == 0.0 && year >= f64::from(i32::MIN) && year <= f64::from(i32::MAX))
        .then(|| year as i32)
}

impl From<Vec<i32>> for YearSet {
    fn from(years: Vec<i32>) -> Self {
        Self::new(years)
    }
}

impl FromIterator<i32> for YearSet {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a YearSet {
    type Item = &'a i32;
    type IntoIter = std::slice::Iter<'a, i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Optional index of the Unfallatlas data directory.
///
/// The JSON document has the shape
/// `{ "years": [2021, 2022], "pathsByYear": { "2021": ["a.csv"] } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Every year listed in `years` or as a `pathsByYear` key.
    pub years: YearSet,
    /// Candidate file paths per year, tried in order.
    pub paths_by_year: BTreeMap<i32, Vec<String>>,
}

impl Manifest {
    /// Normalizes a raw manifest document. Malformed entries are dropped
    /// rather than rejected.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut paths_by_year = BTreeMap::new();

        if let Some(entries) = value.get("pathsByYear").and_then(|v| v.as_object()) {
            for (year_text, paths) in entries {
                let Ok(year) = year_text.trim().parse::<i32>() else {
                    continue;
                };
                let Some(paths) = paths.as_array() else {
                    continue;
                };
                let paths: Vec<String> = paths
                    .iter()
                    .filter_map(|p| p.as_str().map(str::to_owned))
                    .collect();
                if !paths.is_empty() {
                    paths_by_year.insert(year, paths);
                }
            }
        }

        let listed = value
            .get("years")
            .map(YearSet::from_json)
            .unwrap_or_default();
        let years = YearSet::new(
            listed
                .as_slice()
                .iter()
                .copied()
                .chain(paths_by_year.keys().copied()),
        );

        Self {
            years,
            paths_by_year,
        }
    }

    /// Candidate paths for `year`, if the manifest lists any.
    #[must_use]
    pub fn paths_for(&self, year: i32) -> Option<&[String]> {
        self.paths_by_year.get(&year).map(Vec::as_slice)
    }
}

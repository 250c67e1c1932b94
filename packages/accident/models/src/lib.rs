#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Accident type taxonomy and per-source severity definitions.
//!
//! Every marker carries exactly one [`AccidentType`] and one
//! [`SeverityType`]. Accident types are shared by all data sources, while
//! severities are namespaced per source: the local dataset derives its
//! severity from injury counts ([`LocalSeverity`]) and the Unfallatlas
//! exports carry an explicit accident category code
//! ([`UnfallatlasSeverity`]). The two severity taxonomies are never merged
//! into a single ranking.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which participant classes were involved in an accident.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AccidentType {
    /// Cyclist(s) and motor vehicle(s), no pedestrians
    BikeAndVehicle,
    /// Pedestrian(s) and motor vehicle(s), no cyclists
    PedestrianAndVehicle,
    /// Cyclist(s) and pedestrian(s), no motor vehicles
    BikeAndPedestrian,
    /// Exactly one cyclist and nobody else
    SingleBike,
    /// Several cyclists and nobody else
    BikeOnly,
    /// Participant combination not covered by any other category
    DefaultFill,
}

impl AccidentType {
    /// Returns all variants of this enum, in legend order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::BikeAndVehicle,
            Self::PedestrianAndVehicle,
            Self::BikeAndPedestrian,
            Self::SingleBike,
            Self::BikeOnly,
            Self::DefaultFill,
        ]
    }

    /// Marker fill colour for this accident type.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::BikeAndVehicle => "#FF0000",
            Self::PedestrianAndVehicle => "#FFA500",
            Self::BikeAndPedestrian => "#FFDC00",
            Self::SingleBike => "#0074D9",
            Self::BikeOnly => "#B10DC9",
            Self::DefaultFill => "#0FF",
        }
    }

    /// Legend description shown next to the colour swatch.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::BikeAndVehicle => "Fahrrad- und Fahrzeugunfall",
            Self::PedestrianAndVehicle => "Fußgänger- und Fahrzeugunfall",
            Self::BikeAndPedestrian => "Fahrrad- und Fußgängerunfall",
            Self::SingleBike => "Unfall nur mit Fahrrädern",
            Self::BikeOnly => "Fahrradunfall ohne Beteiligte",
            Self::DefaultFill => "Unbekannter Unfalltyp",
        }
    }
}

/// Severity derived from the injury counts of the local dataset.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalSeverity {
    /// At least one severely injured cyclist
    SevereInjury,
    /// At least one injured cyclist or pedestrian
    Injury,
    /// Nobody injured
    NoInjury,
}

impl LocalSeverity {
    /// Returns all variants of this enum, most severe first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::SevereInjury, Self::Injury, Self::NoInjury]
    }

    /// Marker radius in pixels.
    #[must_use]
    pub const fn radius(self) -> u8 {
        match self {
            Self::SevereInjury => 9,
            Self::Injury => 6,
            Self::NoInjury => 3,
        }
    }

    /// Legend description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SevereInjury => "Schwerverletzungen",
            Self::Injury => "Verletzungen",
            Self::NoInjury => "Keine Verletzungen",
        }
    }
}

/// Accident category as coded in the `UKATEGORIE` column of the Unfallatlas
/// exports.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UnfallatlasSeverity {
    /// Category 1: accident with fatalities
    Fatality = 1,
    /// Category 2: accident with severely injured persons
    SevereInjury = 2,
    /// Category 3: accident with lightly injured persons
    LightInjury = 3,
}

impl UnfallatlasSeverity {
    /// Returns all variants of this enum, most severe first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Fatality, Self::SevereInjury, Self::LightInjury]
    }

    /// Looks up the category for a raw `UKATEGORIE` code.
    ///
    /// Returns `None` for codes outside 1-3; such rows are discarded rather
    /// than defaulted.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Fatality),
            2 => Some(Self::SevereInjury),
            3 => Some(Self::LightInjury),
            _ => None,
        }
    }

    /// Returns the numeric category code (1 = most severe).
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Marker radius in pixels.
    #[must_use]
    pub const fn radius(self) -> u8 {
        match self {
            Self::Fatality => 10,
            Self::SevereInjury => 7,
            Self::LightInjury => 4,
        }
    }

    /// Popup description of the category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Fatality => "Kategorie 1: Mit Getoeteten",
            Self::SevereInjury => "Kategorie 2: Mit Schwerverletzten",
            Self::LightInjury => "Kategorie 3: Mit Leichtverletzten",
        }
    }

    /// Short legend label.
    #[must_use]
    pub const fn legend(self) -> &'static str {
        match self {
            Self::Fatality => "Mit Getöteten",
            Self::SevereInjury => "Mit Schwerverletzten",
            Self::LightInjury => "Mit Leichtverletzten",
        }
    }
}

/// A source-namespaced severity.
///
/// Serialized as a single prefixed key such as `LOCAL_INJURY` or
/// `UNFALLATLAS_FATALITY`, so that keys from the two taxonomies can share
/// one selection set without ever colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SeverityType {
    /// Severity from the local dataset.
    Local(LocalSeverity),
    /// Severity from the Unfallatlas exports.
    Unfallatlas(UnfallatlasSeverity),
}

const LOCAL_PREFIX: &str = "LOCAL_";
const UNFALLATLAS_PREFIX: &str = "UNFALLATLAS_";

impl SeverityType {
    /// Returns every severity key of both taxonomies, local first.
    #[must_use]
    pub fn all() -> Vec<Self> {
        LocalSeverity::all()
            .iter()
            .copied()
            .map(Self::Local)
            .chain(UnfallatlasSeverity::all().iter().copied().map(Self::Unfallatlas))
            .collect()
    }

    /// Marker radius in pixels.
    #[must_use]
    pub const fn radius(self) -> u8 {
        match self {
            Self::Local(s) => s.radius(),
            Self::Unfallatlas(s) => s.radius(),
        }
    }

    /// Legend description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Local(s) => s.description(),
            Self::Unfallatlas(s) => s.legend(),
        }
    }
}

impl From<LocalSeverity> for SeverityType {
    fn from(value: LocalSeverity) -> Self {
        Self::Local(value)
    }
}

impl From<UnfallatlasSeverity> for SeverityType {
    fn from(value: UnfallatlasSeverity) -> Self {
        Self::Unfallatlas(value)
    }
}

impl std::fmt::Display for SeverityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(s) => write!(f, "{LOCAL_PREFIX}{s}"),
            Self::Unfallatlas(s) => write!(f, "{UNFALLATLAS_PREFIX}{s}"),
        }
    }
}

/// Error returned when a string is not a known severity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The rejected key.
    pub key: String,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown severity key '{}'", self.key)
    }
}

impl std::error::Error for InvalidSeverityError {}

impl FromStr for SeverityType {
    type Err = InvalidSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSeverityError { key: s.to_owned() };

        if let Some(rest) = s.strip_prefix(UNFALLATLAS_PREFIX) {
            return UnfallatlasSeverity::from_str(rest)
                .map(Self::Unfallatlas)
                .map_err(|_| invalid());
        }
        if let Some(rest) = s.strip_prefix(LOCAL_PREFIX) {
            return LocalSeverity::from_str(rest)
                .map(Self::Local)
                .map_err(|_| invalid());
        }
        Err(invalid())
    }
}

impl From<SeverityType> for String {
    fn from(value: SeverityType) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for SeverityType {
    type Error = InvalidSeverityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_keys_roundtrip_through_strings() {
        for severity in SeverityType::all() {
            let key = severity.to_string();
            assert_eq!(key.parse::<SeverityType>().unwrap(), severity);
        }
    }

    #[test]
    fn severity_keys_are_prefixed_per_source() {
        assert_eq!(
            SeverityType::Local(LocalSeverity::SevereInjury).to_string(),
            "LOCAL_SEVERE_INJURY"
        );
        assert_eq!(
            SeverityType::Unfallatlas(UnfallatlasSeverity::SevereInjury).to_string(),
            "UNFALLATLAS_SEVERE_INJURY"
        );
    }

    #[test]
    fn taxonomies_are_disjoint() {
        let all = SeverityType::all();
        let mut keys: Vec<String> = all.iter().map(ToString::to_string).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), all.len());
    }

    #[test]
    fn rejects_unknown_severity_key() {
        assert!("SEVERE_INJURY".parse::<SeverityType>().is_err());
        assert!("UNFALLATLAS_INJURY".parse::<SeverityType>().is_err());
    }

    #[test]
    fn unfallatlas_codes_map_directly() {
        assert_eq!(
            UnfallatlasSeverity::from_code(1),
            Some(UnfallatlasSeverity::Fatality)
        );
        assert_eq!(
            UnfallatlasSeverity::from_code(3),
            Some(UnfallatlasSeverity::LightInjury)
        );
        assert_eq!(UnfallatlasSeverity::from_code(0), None);
        assert_eq!(UnfallatlasSeverity::from_code(4), None);
        for severity in UnfallatlasSeverity::all() {
            assert_eq!(
                UnfallatlasSeverity::from_code(i64::from(severity.code())),
                Some(*severity)
            );
        }
    }

    #[test]
    fn serde_uses_prefixed_keys() {
        let value = SeverityType::Unfallatlas(UnfallatlasSeverity::Fatality);
        let key: String = value.into();
        assert_eq!(key, "UNFALLATLAS_FATALITY");
        assert_eq!(SeverityType::try_from(key).unwrap(), value);
    }
}

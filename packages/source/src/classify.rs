//! Accident classification.
//!
//! Classification is expressed as ordered rule tables: the first rule whose
//! predicate matches decides the category, and a table-specific default
//! applies when none does. Both sources share the accident-type categories
//! but derive them from different inputs: the Unfallatlas exports carry
//! participation flags, the local container carries participant counts.

use accident_map_accident_models::{AccidentType, LocalSeverity, UnfallatlasSeverity};

use crate::parsing::json_count;
use accident_map_source_models::PropertyMap;

/// A classification rule: `category` applies when `matches` returns `true`.
pub struct Rule<I, C> {
    pub category: C,
    pub matches: fn(&I) -> bool,
}

/// Returns the category of the first matching rule, or `default`.
#[must_use]
pub fn first_match<I, C: Copy>(rules: &[Rule<I, C>], default: C, input: &I) -> C {
    rules
        .iter()
        .find(|rule| (rule.matches)(input))
        .map_or(default, |rule| rule.category)
}

// ── Unfallatlas ──────────────────────────────────────────────────────────

/// Participation flags of one Unfallatlas record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticipantFlags {
    pub has_bike: bool,
    pub has_pedestrian: bool,
    /// Car, motorcycle, goods vehicle, or other vehicle involved.
    pub has_motor_vehicle: bool,
}

impl ParticipantFlags {
    /// Records involving neither cyclists nor pedestrians are out of scope.
    #[must_use]
    pub const fn in_scope(&self) -> bool {
        self.has_bike || self.has_pedestrian
    }

    /// German participant summary for popups.
    #[must_use]
    pub fn describe(&self) -> String {
        let participants: Vec<&str> = [
            (self.has_bike, "Fahrrad"),
            (self.has_pedestrian, "Fussverkehr"),
            (self.has_motor_vehicle, "Kfz"),
        ]
        .into_iter()
        .filter_map(|(present, label)| present.then_some(label))
        .collect();

        if participants.is_empty() {
            "Unbekannt".to_string()
        } else {
            participants.join(", ")
        }
    }
}

/// Accident types derived from participation flags. The exports carry no
/// cyclist counts, so a lone cyclist is always [`AccidentType::SingleBike`].
pub const UNFALLATLAS_ACCIDENT_RULES: &[Rule<ParticipantFlags, AccidentType>] = &[
    Rule {
        category: AccidentType::BikeAndVehicle,
        matches: |f| f.has_bike && f.has_motor_vehicle && !f.has_pedestrian,
    },
    Rule {
        category: AccidentType::PedestrianAndVehicle,
        matches: |f| !f.has_bike && f.has_pedestrian && f.has_motor_vehicle,
    },
    Rule {
        category: AccidentType::BikeAndPedestrian,
        matches: |f| f.has_bike && f.has_pedestrian && !f.has_motor_vehicle,
    },
    Rule {
        category: AccidentType::SingleBike,
        matches: |f| f.has_bike && !f.has_pedestrian && !f.has_motor_vehicle,
    },
];

#[must_use]
pub fn unfallatlas_accident_type(flags: &ParticipantFlags) -> AccidentType {
    first_match(UNFALLATLAS_ACCIDENT_RULES, AccidentType::DefaultFill, flags)
}

/// Maps the `UKATEGORIE` code. Unknown or missing codes yield `None` and
/// the record is discarded.
#[must_use]
pub fn unfallatlas_severity(code: Option<i64>) -> Option<UnfallatlasSeverity> {
    code.and_then(UnfallatlasSeverity::from_code)
}

// ── Local container ──────────────────────────────────────────────────────

/// Participant and injury counts of one local feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticipantCounts {
    pub bikes: u64,
    pub pedestrians: u64,
    pub motor_vehicles: u64,
    pub injured_bikes: u64,
    pub injured_pedestrians: u64,
    pub severely_injured_bikes: u64,
}

impl ParticipantCounts {
    /// Reads counts from feature properties; missing values are zero.
    #[must_use]
    pub fn from_properties(properties: &PropertyMap) -> Self {
        let count = |key: &str| json_count(properties.get(key));
        Self {
            bikes: count("sum_bike"),
            pedestrians: count("sum_ped"),
            motor_vehicles: count("sum_car_truck_bus"),
            injured_bikes: count("sum_injured_bike"),
            injured_pedestrians: count("sum_injured_ped"),
            severely_injured_bikes: count("sum_severely_injured_bike"),
        }
    }
}

pub const LOCAL_ACCIDENT_RULES: &[Rule<ParticipantCounts, AccidentType>] = &[
    Rule {
        category: AccidentType::BikeAndVehicle,
        matches: |c| c.bikes > 0 && c.pedestrians == 0 && c.motor_vehicles > 0,
    },
    Rule {
        category: AccidentType::PedestrianAndVehicle,
        matches: |c| c.bikes == 0 && c.pedestrians > 0 && c.motor_vehicles > 0,
    },
    Rule {
        category: AccidentType::BikeAndPedestrian,
        matches: |c| c.bikes > 0 && c.pedestrians > 0 && c.motor_vehicles == 0,
    },
    Rule {
        category: AccidentType::SingleBike,
        matches: |c| c.bikes == 1 && c.pedestrians == 0 && c.motor_vehicles == 0,
    },
    Rule {
        category: AccidentType::BikeOnly,
        matches: |c| c.bikes > 1 && c.pedestrians == 0 && c.motor_vehicles == 0,
    },
];

pub const LOCAL_SEVERITY_RULES: &[Rule<ParticipantCounts, LocalSeverity>] = &[
    Rule {
        category: LocalSeverity::SevereInjury,
        matches: |c| c.severely_injured_bikes > 0,
    },
    Rule {
        category: LocalSeverity::Injury,
        matches: |c| c.injured_bikes > 0 || c.injured_pedestrians > 0,
    },
];

#[must_use]
pub fn local_accident_type(counts: &ParticipantCounts) -> AccidentType {
    first_match(LOCAL_ACCIDENT_RULES, AccidentType::DefaultFill, counts)
}

#[must_use]
pub fn local_severity(counts: &ParticipantCounts) -> LocalSeverity {
    first_match(LOCAL_SEVERITY_RULES, LocalSeverity::NoInjury, counts)
}

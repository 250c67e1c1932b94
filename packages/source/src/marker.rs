//! Marker construction from parsed rows and point features.
//!
//! Every path validates geometry first. Anything that cannot become a
//! marker is reported as a [`SkipReason`] so callers can count skips
//! without treating them as errors.

use std::sync::Arc;

use accident_map_accident_models::SeverityType;
use accident_map_source_models::{DataSource, Marker, PopupContent, PropertyMap};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};

use crate::classify::{
    ParticipantCounts, ParticipantFlags, local_accident_type, local_severity,
    unfallatlas_accident_type, unfallatlas_severity,
};
use crate::parsing::{parse_coordinate, parse_flag, parse_integer};
use crate::schema::{Column, ColumnIndex};

/// Why an input did not produce a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Missing or non-point geometry.
    InvalidGeometry,
    /// Coordinates missing, malformed, or not finite.
    InvalidCoordinates,
    /// Neither a cyclist nor a pedestrian was involved.
    OutOfScope,
    /// The severity code is not one of the known categories.
    UnknownSeverity,
}

/// Builds a local marker from a point feature.
///
/// The feature's properties become the eager popup content.
///
/// # Errors
///
/// Returns [`SkipReason::InvalidGeometry`] unless the feature is a point
/// with at least two coordinates, and [`SkipReason::InvalidCoordinates`]
/// if either coordinate is not finite.
pub fn from_feature(feature: geojson::Feature) -> Result<Marker, SkipReason> {
    let (longitude, latitude) = feature
        .geometry
        .as_ref()
        .and_then(|geometry| match &geometry.value {
            geojson::Value::Point(position) if position.len() >= 2 => {
                Some((position[0], position[1]))
            }
            _ => None,
        })
        .ok_or(SkipReason::InvalidGeometry)?;

    let properties = feature.properties.unwrap_or_default();
    let counts = ParticipantCounts::from_properties(&properties);

    Marker::new(
        DataSource::Local,
        latitude,
        longitude,
        local_accident_type(&counts),
        SeverityType::Local(local_severity(&counts)),
        PopupContent::Eager(properties),
    )
    .ok_or(SkipReason::InvalidCoordinates)
}

/// Builds an Unfallatlas marker from one data row.
///
/// `fallback_year` is used when `UJAHR` does not parse. The popup is
/// deferred and only rendered when the marker is opened.
///
/// # Errors
///
/// Returns the [`SkipReason`] for rows without usable coordinates, rows
/// outside the cyclist/pedestrian scope, and rows with an unknown
/// severity code, checked in that order.
pub fn from_unfallatlas_row<S: AsRef<str>>(
    fields: &[S],
    columns: &ColumnIndex,
    fallback_year: i32,
    source_name: &Arc<str>,
) -> Result<Marker, SkipReason> {
    let value = |column| columns.value(fields, column);

    let longitude = value(Column::Longitude).and_then(parse_coordinate);
    let latitude = value(Column::Latitude).and_then(parse_coordinate);
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(SkipReason::InvalidCoordinates);
    };

    let flags = ParticipantFlags {
        has_bike: parse_flag(value(Column::Bike)),
        has_pedestrian: parse_flag(value(Column::Pedestrian)),
        has_motor_vehicle: parse_flag(value(Column::Car))
            || parse_flag(value(Column::Motorcycle))
            || parse_flag(value(Column::GoodsVehicle))
            || parse_flag(value(Column::OtherVehicle)),
    };
    if !flags.in_scope() {
        return Err(SkipReason::OutOfScope);
    }

    let severity = unfallatlas_severity(value(Column::Category).and_then(parse_integer))
        .ok_or(SkipReason::UnknownSeverity)?;

    let year = value(Column::Year)
        .and_then(parse_integer)
        .unwrap_or_else(|| i64::from(fallback_year));
    let month = value(Column::Month).and_then(parse_integer);
    let hour = value(Column::Hour).and_then(parse_integer);

    let source_name = Arc::clone(source_name);
    let popup = PopupContent::Lazy(Box::new(move || {
        let or_unknown = |v: Option<i64>| v.map_or_else(|| Value::from("N/A"), Value::from);
        let mut properties = PropertyMap::new();
        properties.insert("Quelle".into(), Value::from(&*source_name));
        properties.insert("Jahr".into(), Value::from(year));
        properties.insert("Monat".into(), or_unknown(month));
        properties.insert("Stunde".into(), or_unknown(hour));
        properties.insert("Schweregrad".into(), Value::from(severity.description()));
        properties.insert("Beteiligung".into(), Value::from(flags.describe()));
        properties
    }));

    Marker::new(
        DataSource::Unfallatlas,
        latitude,
        longitude,
        unfallatlas_accident_type(&flags),
        SeverityType::Unfallatlas(severity),
        popup,
    )
    .ok_or(SkipReason::InvalidCoordinates)
}

#[cfg(test)]
mod tests {
    use accident_map_accident_models::{AccidentType, LocalSeverity, UnfallatlasSeverity};

    use super::*;
    use crate::schema::UNFALLATLAS_COLUMNS;

    const HEADER: &[&str] = &[
        "UJAHR", "UMONAT", "USTUNDE", "UKATEGORIE", "IstRad", "IstFuss", "IstPKW", "IstKrad",
        "IstSonstige", "XGCSWGS84", "YGCSWGS84",
    ];

    fn columns() -> ColumnIndex {
        ColumnIndex::resolve(HEADER, UNFALLATLAS_COLUMNS).unwrap()
    }

    fn source_name() -> Arc<str> {
        Arc::from("Unfallatlas")
    }

    fn row(values: &str) -> Vec<String> {
        values.split(';').map(str::to_owned).collect()
    }

    #[test]
    fn single_bike_fatality() {
        let marker = from_unfallatlas_row(
            &row("2022;5;14;1;1;0;0;0;0;8,4;49,0"),
            &columns(),
            2022,
            &source_name(),
        )
        .unwrap();
        assert_eq!(marker.accident_type(), AccidentType::SingleBike);
        assert_eq!(
            marker.severity_type(),
            SeverityType::Unfallatlas(UnfallatlasSeverity::Fatality)
        );
        assert!((marker.latitude() - 49.0).abs() < f64::EPSILON);
        assert!((marker.longitude() - 8.4).abs() < f64::EPSILON);
        assert!(marker.popup().is_lazy());
    }

    #[test]
    fn popup_properties_are_built_lazily() {
        let marker = from_unfallatlas_row(
            &row(";;;2;1;0;1;0;0;8,4;49,0"),
            &columns(),
            2021,
            &source_name(),
        )
        .unwrap();
        let properties = marker.popup_properties();
        assert_eq!(properties["Quelle"], "Unfallatlas");
        assert_eq!(properties["Jahr"], 2021);
        assert_eq!(properties["Monat"], "N/A");
        assert_eq!(properties["Stunde"], "N/A");
        assert_eq!(properties["Schweregrad"], "Kategorie 2: Mit Schwerverletzten");
        assert_eq!(properties["Beteiligung"], "Fahrrad, Kfz");
        let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["Quelle", "Jahr", "Monat", "Stunde", "Schweregrad", "Beteiligung"]
        );
    }

    #[test]
    fn skips_rows_without_coordinates() {
        let result = from_unfallatlas_row(
            &row("2022;5;14;1;1;0;0;0;0;;49,0"),
            &columns(),
            2022,
            &source_name(),
        );
        assert_eq!(result.unwrap_err(), SkipReason::InvalidCoordinates);
    }

    #[test]
    fn skips_vehicle_only_rows() {
        let result = from_unfallatlas_row(
            &row("2022;5;14;1;0;0;1;1;0;8,4;49,0"),
            &columns(),
            2022,
            &source_name(),
        );
        assert_eq!(result.unwrap_err(), SkipReason::OutOfScope);
    }

    #[test]
    fn skips_unknown_severity() {
        let result = from_unfallatlas_row(
            &row("2022;5;14;9;0;1;1;0;0;8,4;49,0"),
            &columns(),
            2022,
            &source_name(),
        );
        assert_eq!(result.unwrap_err(), SkipReason::UnknownSeverity);
    }

    #[test]
    fn short_row_is_skipped() {
        let result = from_unfallatlas_row(&row("2022;5"), &columns(), 2022, &source_name());
        assert_eq!(result.unwrap_err(), SkipReason::InvalidCoordinates);
    }

    fn feature(value: serde_json::Value) -> geojson::Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn builds_local_marker_from_point() {
        let marker = from_feature(feature(serde_json::json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [8.4, 49.0] },
            "properties": { "sum_bike": 2, "sum_ped": 0, "sum_car_truck_bus": 0 }
        })))
        .unwrap();
        assert_eq!(marker.source(), DataSource::Local);
        assert_eq!(marker.accident_type(), AccidentType::BikeOnly);
        assert_eq!(marker.severity_type(), SeverityType::Local(LocalSeverity::NoInjury));
        assert!(!marker.popup().is_lazy());
        assert_eq!(marker.popup_properties()["sum_bike"], 2);
    }

    #[test]
    fn rejects_non_point_geometry() {
        let line = feature(serde_json::json!({
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": [[8.4, 49.0], [8.5, 49.1]] },
            "properties": {}
        }));
        assert_eq!(from_feature(line).unwrap_err(), SkipReason::InvalidGeometry);

        let missing = feature(serde_json::json!({
            "type": "Feature",
            "geometry": null,
            "properties": {}
        }));
        assert_eq!(from_feature(missing).unwrap_err(), SkipReason::InvalidGeometry);
    }
}

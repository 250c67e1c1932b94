//! Header schema resolution.
//!
//! A [`ColumnSpec`] table lists every logical column a source needs and how
//! it may appear in the header: under one required name, under an optional
//! name, or under any name of an alias group. [`ColumnIndex::resolve`] maps
//! a header row onto that table once per file, so row processing only does
//! positional lookups.

use std::collections::BTreeMap;

use strum_macros::{AsRefStr, Display};

/// Errors raised while resolving a header row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The input contained no header row.
    #[error("missing header row")]
    MissingHeader,

    /// Required columns or whole alias groups are absent.
    #[error("missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// One entry per missing column; alias groups read `A or B`.
        columns: Vec<String>,
    },
}

/// Logical columns of an Unfallatlas export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
pub enum Column {
    Year,
    Month,
    Hour,
    Category,
    Bike,
    Pedestrian,
    Car,
    Motorcycle,
    GoodsVehicle,
    OtherVehicle,
    Longitude,
    Latitude,
}

/// How a logical column may appear in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRule {
    /// Must be present under this exact name.
    Required(&'static str),
    /// Used when present; absent columns resolve to no position.
    Optional(&'static str),
    /// At least one of the names must be present; the first listed name
    /// that is present wins.
    AnyOf(&'static [&'static str]),
}

impl HeaderRule {
    fn describe(self) -> String {
        match self {
            Self::Required(name) | Self::Optional(name) => name.to_string(),
            Self::AnyOf(names) => names.join(" or "),
        }
    }
}

/// One entry of a schema table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub column: Column,
    pub rule: HeaderRule,
}

const fn required(column: Column, name: &'static str) -> ColumnSpec {
    ColumnSpec {
        column,
        rule: HeaderRule::Required(name),
    }
}

/// Columns of the yearly Unfallatlas exports.
///
/// Older exports (2017) omit `IstGkfz`, and the "other vehicle" flag has
/// been published as both `IstSonstige` and `IstSonstig`.
pub const UNFALLATLAS_COLUMNS: &[ColumnSpec] = &[
    required(Column::Year, "UJAHR"),
    required(Column::Month, "UMONAT"),
    required(Column::Hour, "USTUNDE"),
    required(Column::Category, "UKATEGORIE"),
    required(Column::Bike, "IstRad"),
    required(Column::Pedestrian, "IstFuss"),
    required(Column::Car, "IstPKW"),
    required(Column::Motorcycle, "IstKrad"),
    ColumnSpec {
        column: Column::GoodsVehicle,
        rule: HeaderRule::Optional("IstGkfz"),
    },
    ColumnSpec {
        column: Column::OtherVehicle,
        rule: HeaderRule::AnyOf(&["IstSonstige", "IstSonstig"]),
    },
    required(Column::Longitude, "XGCSWGS84"),
    required(Column::Latitude, "YGCSWGS84"),
];

/// Positions of logical columns within a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    positions: BTreeMap<Column, usize>,
}

impl ColumnIndex {
    /// Resolves `header` (already cleaned field names) against `specs`.
    ///
    /// Header names are matched exactly. When a name occurs more than once
    /// the last occurrence wins.
    ///
    /// # Errors
    ///
    /// * [`SchemaError::MissingHeader`] if `header` is empty.
    /// * [`SchemaError::MissingColumns`] naming every absent required
    ///   column and every alias group with no member present.
    pub fn resolve<S: AsRef<str>>(
        header: &[S],
        specs: &[ColumnSpec],
    ) -> Result<Self, SchemaError> {
        if header.is_empty() {
            return Err(SchemaError::MissingHeader);
        }

        let by_name: BTreeMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(position, name)| (name.as_ref(), position))
            .collect();

        let mut positions = BTreeMap::new();
        let mut missing = Vec::new();

        for spec in specs {
            let found = match spec.rule {
                HeaderRule::Required(name) | HeaderRule::Optional(name) => {
                    by_name.get(name).copied()
                }
                HeaderRule::AnyOf(names) => {
                    names.iter().find_map(|name| by_name.get(name).copied())
                }
            };

            match (found, spec.rule) {
                (Some(position), _) => {
                    positions.insert(spec.column, position);
                }
                (None, HeaderRule::Optional(_)) => {}
                (None, rule) => missing.push(rule.describe()),
            }
        }

        if missing.is_empty() {
            Ok(Self { positions })
        } else {
            Err(SchemaError::MissingColumns { columns: missing })
        }
    }

    /// Position of `column`, or `None` for an absent optional column.
    #[must_use]
    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    /// Value of `column` in `fields`. Short rows and absent optional
    /// columns yield `None`.
    #[must_use]
    pub fn value<'a, S: AsRef<str>>(&self, fields: &'a [S], column: Column) -> Option<&'a str> {
        self.position(column)
            .and_then(|position| fields.get(position))
            .map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_HEADER: &[&str] = &[
        "OBJECTID", "UJAHR", "UMONAT", "USTUNDE", "UKATEGORIE", "IstRad", "IstPKW", "IstFuss",
        "IstKrad", "IstGkfz", "IstSonstige", "XGCSWGS84", "YGCSWGS84",
    ];

    #[test]
    fn resolves_full_header() {
        let index = ColumnIndex::resolve(FULL_HEADER, UNFALLATLAS_COLUMNS).unwrap();
        assert_eq!(index.position(Column::Year), Some(1));
        assert_eq!(index.position(Column::Car), Some(6));
        assert_eq!(index.position(Column::GoodsVehicle), Some(9));
        assert_eq!(index.position(Column::OtherVehicle), Some(10));
        assert_eq!(index.position(Column::Latitude), Some(12));
    }

    #[test]
    fn optional_column_may_be_absent() {
        let header: Vec<&str> = FULL_HEADER
            .iter()
            .copied()
            .filter(|name| *name != "IstGkfz")
            .collect();
        let index = ColumnIndex::resolve(&header, UNFALLATLAS_COLUMNS).unwrap();
        assert_eq!(index.position(Column::GoodsVehicle), None);
    }

    #[test]
    fn alias_group_accepts_any_member() {
        let header: Vec<&str> = FULL_HEADER
            .iter()
            .map(|name| if *name == "IstSonstige" { "IstSonstig" } else { name })
            .collect();
        let index = ColumnIndex::resolve(&header, UNFALLATLAS_COLUMNS).unwrap();
        assert_eq!(index.position(Column::OtherVehicle), Some(10));
    }

    #[test]
    fn reports_every_missing_column() {
        let header = ["UJAHR", "UMONAT", "USTUNDE", "UKATEGORIE", "IstRad", "IstFuss", "IstPKW"];
        let err = ColumnIndex::resolve(&header, UNFALLATLAS_COLUMNS).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns {
                columns: vec![
                    "IstKrad".to_string(),
                    "IstSonstige or IstSonstig".to_string(),
                    "XGCSWGS84".to_string(),
                    "YGCSWGS84".to_string(),
                ],
            }
        );
        assert_eq!(
            err.to_string(),
            "missing required columns: IstKrad, IstSonstige or IstSonstig, XGCSWGS84, YGCSWGS84"
        );
    }

    #[test]
    fn missing_severity_column_is_named() {
        let header: Vec<&str> = FULL_HEADER
            .iter()
            .copied()
            .filter(|name| *name != "UKATEGORIE")
            .collect();
        let err = ColumnIndex::resolve(&header, UNFALLATLAS_COLUMNS).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns {
                columns: vec!["UKATEGORIE".to_string()],
            }
        );
        assert_eq!(err.to_string(), "missing required columns: UKATEGORIE");
    }

    #[test]
    fn empty_header_is_missing() {
        let header: [&str; 0] = [];
        assert_eq!(
            ColumnIndex::resolve(&header, UNFALLATLAS_COLUMNS),
            Err(SchemaError::MissingHeader)
        );
    }

    #[test]
    fn short_rows_yield_none() {
        let index = ColumnIndex::resolve(FULL_HEADER, UNFALLATLAS_COLUMNS).unwrap();
        let row = ["1", "2022", "5"];
        assert_eq!(index.value(&row, Column::Year), Some("2022"));
        assert_eq!(index.value(&row, Column::Latitude), None);
    }
}

//! Shared parsing utilities for raw field values.
//!
//! Unfallatlas exports encode integers as plain digits and coordinates with
//! a decimal comma (`"8,4037"`). Local container properties arrive as JSON
//! values of varying types.

/// Parses the leading integer of a field, e.g. `"3"`, `" 12 "` or `"7a"`.
///
/// Returns `None` for empty fields and fields that do not start with a
/// digit (after an optional sign).
#[must_use]
pub fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    let (sign, digits) = match value.as_bytes().first()? {
        b'-' => (-1, &value[1..]),
        b'+' => (1, &value[1..]),
        _ => (1, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// A participation flag is set when the field parses to a positive integer.
#[must_use]
pub fn parse_flag(value: Option<&str>) -> bool {
    value.and_then(parse_integer).is_some_and(|n| n > 0)
}

/// Parses a WGS84 coordinate, accepting a decimal comma.
///
/// Returns `None` for empty, malformed, or non-finite values.
#[must_use]
pub fn parse_coordinate(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let normalized = value.replacen(',', ".", 1);
    normalized
        .parse::<f64>()
        .ok()
        .filter(|coordinate| coordinate.is_finite())
}

/// Reads a count from a JSON property. Missing, negative, or non-numeric
/// values count as zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn json_count(value: Option<&serde_json::Value>) -> u64 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

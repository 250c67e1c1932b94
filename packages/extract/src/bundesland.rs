//! German federal states and their `ULAND` codes.

use std::borrow::Cow;

use crate::ExtractError;

/// Normalized state names and their two-digit codes. Names are listed with
/// both the `ue` transliteration and the folded umlaut.
const BUNDESLAND_CODES: &[(&str, &str)] = &[
    ("schleswigholstein", "01"),
    ("hamburg", "02"),
    ("niedersachsen", "03"),
    ("bremen", "04"),
    ("nordrheinwestfalen", "05"),
    ("hessen", "06"),
    ("rheinlandpfalz", "07"),
    ("badenwuerttemberg", "08"),
    ("badenwurttemberg", "08"),
    ("bayern", "09"),
    ("saarland", "10"),
    ("berlin", "11"),
    ("brandenburg", "12"),
    ("mecklenburgvorpommern", "13"),
    ("sachsen", "14"),
    ("sachsenanhalt", "15"),
    ("thueringen", "16"),
    ("thuringen", "16"),
];

/// Folds diacritics, lowercases, and drops everything that is not an ASCII
/// letter or digit: `"Baden-Württemberg"` becomes `"badenwurttemberg"`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'a'..='z' | '0'..='9' => normalized.push(c),
            'ä' | 'á' | 'à' | 'â' | 'å' => normalized.push('a'),
            'ö' | 'ó' | 'ò' | 'ô' => normalized.push('o'),
            'ü' | 'ú' | 'ù' | 'û' => normalized.push('u'),
            'é' | 'è' | 'ê' | 'ë' => normalized.push('e'),
            'í' | 'ì' | 'î' | 'ï' => normalized.push('i'),
            'ç' => normalized.push('c'),
            'ñ' => normalized.push('n'),
            'ß' => normalized.push_str("ss"),
            _ => {}
        }
    }
    normalized
}

/// Resolves a state name or a two-digit `ULAND` code.
///
/// # Errors
///
/// Returns [`ExtractError::UnsupportedRegion`] if `value` is neither a
/// two-digit code nor a known state name.
pub fn resolve_code(value: &str) -> Result<String, ExtractError> {
    let trimmed = value.trim();
    if trimmed.len() == 2 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(trimmed.to_string());
    }

    let name = normalize_name(trimmed);
    BUNDESLAND_CODES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, code)| (*code).to_string())
        .ok_or_else(|| ExtractError::UnsupportedRegion {
            value: value.to_string(),
        })
}

/// Zero-pads one-digit `ULAND` values; older exports write `8` for `08`.
#[must_use]
pub fn normalize_code(value: &str) -> Cow<'_, str> {
    if value.chars().count() == 1 {
        Cow::Owned(format!("0{value}"))
    } else {
        Cow::Borrowed(value)
    }
}

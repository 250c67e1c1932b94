//! HTML rendering of popup properties.

use accident_map_source_models::PropertyMap;
use serde_json::Value;

/// Renders popup properties as an HTML key/value table.
///
/// Keys and values are HTML-escaped. `None` renders a placeholder
/// paragraph.
#[must_use]
pub fn render_popup_html(properties: Option<&PropertyMap>) -> String {
    let Some(properties) = properties else {
        return r#"<p class="popup-no-properties">No properties available for this feature.</p>"#
            .to_string();
    };

    let rows: String = properties
        .iter()
        .map(|(key, value)| {
            format!(
                r#"<tr><td class="popup-key">{}</td><td class="popup-value">{}</td></tr>"#,
                escape_html(key),
                escape_html(&format_value(value)),
            )
        })
        .collect();

    format!(
        r#"<div class="popup-container"><h3 class="popup-header">Feature Properties</h3><table class="popup-table"><thead><tr class="popup-table-header"><th class="popup-table-key">Key</th><th class="popup-table-value">Value</th></tr></thead><tbody>{rows}</tbody></table></div>"#
    )
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

//! Field-level coercions. Each one is total: bad input degrades to the
//! field's empty default instead of failing.

use serde_json::Value;

/// Plain text field: trimmed, `""` when missing or not a scalar.
pub fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_text(n),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Numeric field kept as a decimal string, `""` when unparsable.
pub fn numeric(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_default(),
        Value::String(s) => parse_number(s).map(format_number).unwrap_or_default(),
        _ => String::new(),
    }
}

pub fn flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// List of strings. Scalars are wrapped, nulls dropped.
pub fn list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(element_text)
            .collect(),
        other => vec![element_text(other)],
    }
}

/// [`list`] with repeats removed, first occurrence kept.
pub fn unique_list(value: &Value) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in list(value) {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn element_text(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => value.to_string(),
        scalar => text(scalar),
    }
}

fn number_to_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(format_number).unwrap_or_default()
    }
}

/// Integral values print without a fractional part. A printed fraction
/// never ends in `0`, which [`parse_number`] relies on to stay idempotent.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse a human-written number such as `"250 000 €"`, `"1.234,5"` or
/// `"1,234.5"`.
///
/// When both separators appear the last one is the decimal mark. A repeated
/// separator, or a lone one followed by exactly three digits ending in `0`
/// after a short head (`185.000`, `2,500`), is a thousands separator.
/// Otherwise a lone `,` is a decimal comma and a lone `.` a decimal point,
/// so `1.567` stays a fraction.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let negative = trimmed.starts_with('-');
    let mut cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let dots = cleaned.matches('.').count();
    let commas = cleaned.matches(',').count();

    if dots > 0 && commas > 0 {
        let last_dot = cleaned.rfind('.').unwrap_or(0);
        let last_comma = cleaned.rfind(',').unwrap_or(0);
        cleaned = if last_comma > last_dot {
            cleaned.replace('.', "").replace(',', ".")
        } else {
            cleaned.replace(',', "")
        };
    } else if commas > 1 || (commas == 1 && is_grouped(&cleaned, ',')) {
        cleaned = cleaned.replace(',', "");
    } else if commas == 1 {
        cleaned = cleaned.replace(',', ".");
    } else if dots > 1 || (dots == 1 && is_grouped(&cleaned, '.')) {
        cleaned = cleaned.replace('.', "");
    }

    let cleaned = cleaned.trim_end_matches('.');
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// `185.000` style: one to three leading digits (not starting with zero)
/// followed by a single group of three ending in zero. [`format_number`]
/// never prints such a tail.
fn is_grouped(cleaned: &str, sep: char) -> bool {
    match cleaned.split_once(sep) {
        Some((head, tail)) => {
            (1..=3).contains(&head.len())
                && !head.starts_with('0')
                && tail.len() == 3
                && tail.ends_with('0')
                && head.chars().chain(tail.chars()).all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

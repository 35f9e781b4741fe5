//! Cell-level coercions shared by the steps.
//!
//! Cells arrive as JSON values (strings from CSV, typed values from
//! workbooks). Numeric coercion follows the usual "coerce" semantics: anything
//! that does not parse as a finite number is missing, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// A 4-digit year between 1900 and 2099 standing as its own word.
static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:19|20)\d{2})\b").expect("year pattern is valid")
});

/// Render a scalar cell as text. Null and containers yield `None`.
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Trimmed, non-empty text of a cell.
pub fn text(value: &Value) -> Option<String> {
    as_string(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Coerce a cell to a finite `f64`; anything else is missing.
pub fn to_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;
    n.is_finite().then_some(n)
}

/// Sum the present values; an all-missing input sums to zero.
pub fn sum_present<I: IntoIterator<Item = Option<f64>>>(values: I) -> f64 {
    values.into_iter().flatten().sum()
}

/// Round to `decimals` places, ties to even (`0.25` gives `0.2`).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Extract the year token from a column header such as
/// `"Jan 2024 - Installation Quantity"`.
pub fn year_token(header: &str) -> Option<u16> {
    YEAR_TOKEN
        .captures(header)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Normalize a postcode cell to a join key.
///
/// Numeric cells and numeric strings become 4-digit zero-padded integers
/// (`800` and `"0800"` and `800.0` all give `"0800"`); other text is trimmed.
pub fn postcode_key(value: &Value) -> Option<String> {
    let raw = text(value)?;
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        _ => raw.parse::<f64>().ok(),
    };
    match numeric {
        Some(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 => Some(format!("{:04}", n as u64)),
        _ => Some(raw),
    }
}

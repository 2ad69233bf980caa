use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Magnitudes below this round to zero at five fractional digits.
const ROUNDS_TO_ZERO: f64 = 5e-6;

/// Reads a decimal from a JSON number or a numeric string.
///
/// Accepts plain (`"43000.12"`) and scientific (`1e-7`) notation. Values too
/// small for `Decimal` come back as zero; values too large, and anything else
/// (null, bool, objects, blank or non-numeric strings) yield `None`.
pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

/// Reads a finite float from a JSON number or a numeric string.
pub(crate) fn float_from_value(value: &Value) -> Option<f64> {
    let float = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    float.is_finite().then_some(float)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
        .or_else(|| {
            let float = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
            (float.abs() < ROUNDS_TO_ZERO).then_some(Decimal::ZERO)
        })
}

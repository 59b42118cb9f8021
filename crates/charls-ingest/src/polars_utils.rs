//! Polars value helpers.
//!
//! Conversions between Polars `AnyValue`s and plain strings/numbers, and
//! column rebuilders used when coercing a column to a new measurement kind.

use polars::prelude::{AnyValue, Column, DataType, NamedFrom, PolarsResult, Series};

/// Converts a Polars `AnyValue` to a `String` representation.
///
/// Returns an empty string for `Null`, formats floats without trailing zeros.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => {
            let s = other.to_string();
            if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
                s[1..s.len() - 1].to_string()
            } else {
                s
            }
        }
    }
}

/// Formats a floating-point number without trailing zeros after the decimal point.
///
/// ```
/// use charls_ingest::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(2.50), "2.5");
/// assert_eq!(format_numeric(40.0), "40");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

/// Converts an `AnyValue` to `f64`, returning `None` for non-numeric or null values.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    }
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Cell values of a column as optional strings; nulls stay `None`.
pub fn string_values(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let mut values = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        let value = column.get(idx)?;
        if matches!(value, AnyValue::Null) {
            values.push(None);
        } else {
            values.push(Some(any_to_string(value)));
        }
    }
    Ok(values)
}

/// Rebuild a column as a String column with the same name and nulls.
///
/// Numbers are rendered with [`format_numeric`], so `1.0` becomes `"1"`.
/// A column that already has the String dtype is returned unchanged.
pub fn to_string_series(column: &Column) -> PolarsResult<Series> {
    if matches!(column.dtype(), DataType::String) {
        return Ok(column.as_materialized_series().clone());
    }
    let values = string_values(column)?;
    Ok(Series::new(column.name().clone(), values))
}

/// Rebuild a column as Float64; unparseable cells become null.
pub fn to_f64_series(column: &Column) -> PolarsResult<Series> {
    if matches!(column.dtype(), DataType::Float64) {
        return Ok(column.as_materialized_series().clone());
    }
    let mut values: Vec<Option<f64>> = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        values.push(any_to_f64(column.get(idx)?));
    }
    Ok(Series::new(column.name().clone(), values))
}

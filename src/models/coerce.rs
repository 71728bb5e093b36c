//! The parse-and-validate boundary for loosely typed values.
//!
//! Values crossing the store, the remote service or an API payload may carry
//! numbers as JSON numbers or as strings, and identities as strings, nulls or
//! anything else. Everything is funnelled through this module so call sites
//! only ever see typed, range-checked values.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// Coerces a non-negative whole count (papers, staff) from a JSON value.
///
/// Accepts integers, integral floats (`5.0`) and numeric strings (`" 7 "`).
/// Returns `None` for anything negative, fractional, out of range or
/// non-numeric.
///
/// # Example
///
/// ```
/// use examiner_payroll::models::coerce;
/// use serde_json::json;
///
/// assert_eq!(coerce::count(&json!(12)), Some(12));
/// assert_eq!(coerce::count(&json!("12")), Some(12));
/// assert_eq!(coerce::count(&json!(-1)), None);
/// assert_eq!(coerce::count(&json!("abc")), None);
/// ```
pub fn count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return u32::try_from(v).ok();
            }
            let f = n.as_f64()?;
            if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
                Some(f as u32)
            } else {
                None
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<u32>() {
                return Some(v);
            }
            let d = Decimal::from_str(s).ok()?;
            if d.is_sign_negative() || !d.fract().is_zero() {
                return None;
            }
            d.to_u32()
        }
        _ => None,
    }
}

/// Coerces a monetary or rate value from a JSON number or numeric string.
pub fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}

/// Coerces a record identity.
///
/// Only a non-empty string that parses as the target identity counts;
/// empty strings, numbers, nulls and garbage all mean "no identity".
pub fn identity<T: FromStr>(value: &Value) -> Option<T> {
    match value {
        Value::String(s) if !s.trim().is_empty() => s.parse().ok(),
        _ => None,
    }
}

/// Coerces a calendar date from `YYYY-MM-DD`, an RFC 3339 timestamp or a
/// naive `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Parses a paper count supplied by a user, rejecting invalid values
/// instead of defaulting them.
///
/// A missing value is treated as zero papers.
pub fn papers(field: &str, value: Option<&Value>) -> EngineResult<u32> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(v) => count(v).ok_or_else(|| {
            EngineError::validation(
                field,
                format!("must be a non-negative whole number, got {}", v),
            )
        }),
    }
}

/// Parses a staff name, rejecting empty or blank names.
pub fn staff_name(field: &str, value: Option<&Value>) -> EngineResult<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(EngineError::validation(field, "must be a non-empty name")),
    }
}

/// Serde adapter: lenient count, defaulting to zero.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count(&value).unwrap_or(0))
}

/// Serde adapter: lenient optional count.
pub fn lenient_opt_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count(&value))
}

/// Serde adapter: lenient decimal, defaulting to zero.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decimal(&value).unwrap_or(Decimal::ZERO))
}

/// Serde adapter: lenient optional date.
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(date(&value))
}

/// Serde adapter: lenient optional identity.
pub fn lenient_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Value::deserialize(deserializer)?;
    Ok(identity(&value))
}

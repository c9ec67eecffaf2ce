//! Serde helpers for the exchange's loosely typed JSON
//!
//! Numbers arrive as strings, missing values arrive as `""`, and response
//! codes may be either a string or a number.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Deserialize a decimal that may be a string, a number, `""` or null
pub fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => parse_decimal(&s).map(Some).map_err(D::Error::custom),
        Some(Value::Number(n)) => parse_decimal(&n.to_string())
            .map(Some)
            .map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!("expected decimal, got {other}"))),
    }
}

/// Deserialize a millisecond unix timestamp given as a string or a number
pub fn deserialize_optional_timestamp_ms<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.is_empty() => return Ok(None),
        Some(Value::String(s)) => s.parse::<i64>().map_err(D::Error::custom)?,
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {n}")))?,
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected millisecond timestamp, got {other}"
            )));
        }
    };
    timestamp_from_millis(millis)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {millis}")))
}

/// Deserialize a response code; absent or empty codes read as 0
pub fn deserialize_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::String(s)) if s.is_empty() => Ok(0),
        Some(Value::String(s)) => s.parse::<i64>().map_err(D::Error::custom),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("code out of range: {n}"))),
        Some(other) => Err(D::Error::custom(format!("expected code, got {other}"))),
    }
}

/// Parse a decimal string, accepting scientific notation
pub fn parse_decimal(s: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s))
}

/// Parse an optional decimal out of a positional array slot
pub fn parse_optional_decimal(s: Option<&String>) -> Result<Option<Decimal>, rust_decimal::Error> {
    match s {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_decimal(s).map(Some),
    }
}

/// Convert milliseconds since the epoch into a UTC timestamp
pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "deserialize_optional_decimal")]
        px: Option<Decimal>,
        #[serde(default, deserialize_with = "deserialize_optional_timestamp_ms")]
        ts: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "deserialize_code")]
        code: i64,
    }

    #[test]
    fn test_string_fields() {
        let s: Sample =
            serde_json::from_str(r#"{"px":"42.5","ts":"1597026383085","code":"50004"}"#).unwrap();
        assert_eq!(s.px, Some(dec!(42.5)));
        assert_eq!(s.ts.unwrap().timestamp_millis(), 1597026383085);
        assert_eq!(s.code, 50004);
    }

    #[test]
    fn test_numeric_fields() {
        let s: Sample = serde_json::from_str(r#"{"px":0.25,"ts":1597026383085,"code":0}"#).unwrap();
        assert_eq!(s.px, Some(dec!(0.25)));
        assert!(s.ts.is_some());
        assert_eq!(s.code, 0);
    }

    #[test]
    fn test_empty_and_missing_fields() {
        let s: Sample = serde_json::from_str(r#"{"px":"","ts":""}"#).unwrap();
        assert_eq!(s.px, None);
        assert_eq!(s.ts, None);
        assert_eq!(s.code, 0);
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(parse_decimal("1e-4").unwrap(), dec!(0.0001));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let res: Result<Sample, _> = serde_json::from_str(r#"{"px":"abc"}"#);
        assert!(res.is_err());
    }
}

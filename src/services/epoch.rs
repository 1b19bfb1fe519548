//! Conversion between client-facing epoch milliseconds and stored instants.
//!
//! Every path that accepts a timestamp from a client goes through
//! [`from_epoch_millis`]; responses serialize with `chrono::serde::ts_milliseconds`,
//! which is the exact inverse.

use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EpochError {
    #[error("Expected an integer epoch timestamp in milliseconds.")]
    NotAnInteger,
    #[error("Epoch timestamp must not be negative.")]
    Negative,
    #[error("Epoch timestamp is out of range.")]
    OutOfRange,
}

pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>, EpochError> {
    if millis < 0 {
        return Err(EpochError::Negative);
    }
    DateTime::from_timestamp_millis(millis).ok_or(EpochError::OutOfRange)
}

pub fn to_epoch_millis(instant: &DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

/// Parses a JSON value holding epoch milliseconds.
pub fn parse_epoch_value(value: &Value) -> Result<DateTime<Utc>, EpochError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(millis) => from_epoch_millis(millis),
            None if n.as_u64().is_some() => Err(EpochError::OutOfRange),
            None => Err(EpochError::NotAnInteger),
        },
        _ => Err(EpochError::NotAnInteger),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_is_identity() {
        for millis in [0, 1, 999, 1_000, 1_700_000_000_123, 4_102_444_800_000] {
            let instant = from_epoch_millis(millis).unwrap();
            assert_eq!(to_epoch_millis(&instant), millis);
        }
    }

    #[test]
    fn test_known_instant() {
        let instant = from_epoch_millis(1_700_000_000_000).unwrap();
        assert_eq!(instant.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_negative_is_rejected() {
        assert_eq!(from_epoch_millis(-1), Err(EpochError::Negative));
    }

    #[test]
    fn test_json_values() {
        assert!(parse_epoch_value(&json!(1_700_000_000_000i64)).is_ok());
        assert_eq!(parse_epoch_value(&json!("1700000000000")), Err(EpochError::NotAnInteger));
        assert_eq!(parse_epoch_value(&json!(1.5)), Err(EpochError::NotAnInteger));
        assert_eq!(parse_epoch_value(&json!(null)), Err(EpochError::NotAnInteger));
        assert_eq!(parse_epoch_value(&json!(u64::MAX)), Err(EpochError::OutOfRange));
        assert_eq!(parse_epoch_value(&json!(i64::MAX)), Err(EpochError::OutOfRange));
    }
}

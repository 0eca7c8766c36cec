//! Timestamp parsing for wire values
//!
//! Backends send points in time either as RFC 3339 strings, as naive ISO
//! strings without an offset (taken as UTC), or as epoch milliseconds.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// Naive layouts accepted when a string carries no offset
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a wire timestamp into a UTC point in time
///
/// Returns `None` for anything that is not a recognizable timestamp,
/// including `null`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

/// Parse a timestamp from its string form
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.and_utc());
    }

    // All-digit strings are epoch milliseconds
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_rfc3339_with_offset() {
        let ts = parse_timestamp(&json!("2024-05-01T14:00:00.250+02:00")).unwrap();
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_naive_string_is_utc() {
        let ts = parse_timestamp(&json!("2024-05-01T12:30:45.123")).unwrap();
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 30, 45));
        assert_eq!(ts.timestamp_subsec_millis(), 123);

        let spaced = parse_timestamp(&json!("2024-05-01 12:30:45")).unwrap();
        assert_eq!(spaced.day(), 1);
    }

    #[test]
    fn test_epoch_millis() {
        let ts = parse_timestamp(&json!(1_714_564_800_500i64)).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_714_564_800_500);

        let from_str = parse_timestamp(&json!("1714564800500")).unwrap();
        assert_eq!(from_str, ts);
    }

    #[test]
    fn test_unrecognized_values() {
        assert!(parse_timestamp(&Value::Null).is_none());
        assert!(parse_timestamp(&json!("yesterday")).is_none());
        assert!(parse_timestamp(&json!("")).is_none());
        assert!(parse_timestamp(&json!({"at": 1})).is_none());
    }
}

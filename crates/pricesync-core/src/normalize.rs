//! Lenient field extraction for provider payloads.
//!
//! Providers disagree on whether numbers arrive as JSON strings or numbers, and use
//! `0` and an absent field interchangeably for unavailable figures. These helpers
//! never fail: an unreadable number becomes `0.0` and an unreadable date is `None`
//! so the caller can skip that one entry.

use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Date format used by every supported provider.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Reads a number that may be encoded as a string or a native JSON number.
///
/// Anything unparsable or non-finite yields `0.0`.
#[must_use]
pub fn lenient_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Reads the first present key of `candidates` from `entry`.
///
/// Returns `default` only when none of the keys is present (or all are `null`);
/// a present but unparsable value yields `0.0`.
#[must_use]
pub fn field(entry: &Map<String, Value>, candidates: &[&str], default: f64) -> f64 {
    candidates
        .iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| !value.is_null())
        .map_or(default, lenient_f64)
}

/// Like [`field`], but `None` when no candidate key is present.
#[must_use]
pub fn optional_field(entry: &Map<String, Value>, candidates: &[&str]) -> Option<f64> {
    candidates
        .iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| !value.is_null())
        .map(lenient_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-02"), NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(parse_date("01/02/2024"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_lenient_f64() {
        assert_eq!(lenient_f64(&json!("12.5")), 12.5);
        assert_eq!(lenient_f64(&json!(" 7 ")), 7.0);
        assert_eq!(lenient_f64(&json!(3)), 3.0);
        assert_eq!(lenient_f64(&json!(1.25)), 1.25);
        assert_eq!(lenient_f64(&json!("n/a")), 0.0);
        assert_eq!(lenient_f64(&json!("NaN")), 0.0);
        assert_eq!(lenient_f64(&json!(null)), 0.0);
        assert_eq!(lenient_f64(&json!({"v": 1})), 0.0);
    }

    #[test]
    fn test_field_defaults_and_candidates() {
        let entry = json!({"4. close": "11", "5. volume": "1000", "broken": "x"});
        let entry = entry.as_object().unwrap();

        assert_eq!(field(entry, &["6. volume", "5. volume"], 0.0), 1000.0);
        assert_eq!(field(entry, &["8. split coefficient"], 1.0), 1.0);
        assert_eq!(field(entry, &["broken"], 1.0), 0.0);
        assert_eq!(optional_field(entry, &["5. adjusted close"]), None);
        assert_eq!(optional_field(entry, &["4. close"]), Some(11.0));
    }
}

//! Whole-second timestamps that tolerate the backend's float encoding.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};

/// Deserialize seconds since the epoch from a JSON integer or float.
///
/// Floats are floored, so `1234567890.75` becomes `1234567890`.
pub(crate) fn deserialize_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(SecondsVisitor)
}

struct SecondsVisitor;

impl<'de> Visitor<'de> for SecondsVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("seconds since the Unix epoch as an integer or float")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("timestamp {} out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if !v.is_finite() || v < i64::MIN as f64 || v > i64::MAX as f64 {
            return Err(E::custom(format!("timestamp {} out of range", v)));
        }
        Ok(v.floor() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "deserialize_seconds")]
        at: i64,
    }

    fn parse(json: &str) -> Result<i64, serde_json::Error> {
        serde_json::from_str::<Wrapper>(json).map(|w| w.at)
    }

    #[test]
    fn test_integer_and_float_seconds() {
        assert_eq!(parse(r#"{"at": 42}"#).unwrap(), 42);
        assert_eq!(parse(r#"{"at": 42.999}"#).unwrap(), 42);
        assert_eq!(parse(r#"{"at": -1.5}"#).unwrap(), -2);
    }

    #[test]
    fn test_rejects_strings_and_overflow() {
        assert!(parse(r#"{"at": "42"}"#).is_err());
        assert!(parse(r#"{"at": 18446744073709551615}"#).is_err());
        assert!(parse(r#"{"at": 1e300}"#).is_err());
    }
}

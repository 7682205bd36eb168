//! Millisecond epoch timestamps as sent by clients
//!
//! Writes carry milliseconds since the Unix epoch; reads render the stored
//! instant as RFC 3339 with millisecond precision. Converting in both
//! directions is lossless at millisecond resolution. Clients that send the
//! value as a JSON float are accepted; any sub-millisecond part is floored.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ValidationError;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EpochMillis(i64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMillis {
    Integer(i64),
    Float(f64),
}

impl<'de> Deserialize<'de> for EpochMillis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawMillis::deserialize(deserializer)? {
            RawMillis::Integer(millis) => Ok(Self(millis)),
            RawMillis::Float(millis) if millis >= i64::MIN as f64 && millis < i64::MAX as f64 => {
                Ok(Self(millis.floor() as i64))
            }
            RawMillis::Float(millis) => Err(serde::de::Error::custom(format!(
                "timestamp out of range: {}",
                millis
            ))),
        }
    }
}

impl EpochMillis {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Convert to a UTC instant.
    ///
    /// # Example
    /// ```
    /// use kataboard_server::models::EpochMillis;
    ///
    /// let ts = EpochMillis::new(1_700_000_000_123);
    /// let at = ts.to_datetime().unwrap();
    /// assert_eq!(EpochMillis::from(at), ts);
    /// ```
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, ValidationError> {
        DateTime::from_timestamp_millis(self.0).ok_or(ValidationError::TimestampOutOfRange {
            field: "timestamp",
            value: self.0,
        })
    }
}

impl From<DateTime<Utc>> for EpochMillis {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis())
    }
}

impl std::fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render an instant the way every read endpoint does.
pub fn to_iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_survive_iso_round_trip() {
        let ts = EpochMillis::new(1_714_566_600_123);
        let rendered = to_iso8601(&ts.to_datetime().unwrap());
        assert_eq!(rendered, "2024-05-01T12:30:00.123Z");

        let parsed = DateTime::parse_from_rfc3339(&rendered)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(EpochMillis::from(parsed), ts);
    }

    #[test]
    fn whole_seconds_keep_millis_suffix() {
        let ts = EpochMillis::new(0);
        assert_eq!(to_iso8601(&ts.to_datetime().unwrap()), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn out_of_range_is_rejected() {
        let err = EpochMillis::new(i64::MAX).to_datetime().unwrap_err();
        assert!(matches!(err, ValidationError::TimestampOutOfRange { .. }));
    }

    #[test]
    fn deserializes_from_bare_integer() {
        let ts: EpochMillis = serde_json::from_str("1714566600123").unwrap();
        assert_eq!(ts, EpochMillis::new(1_714_566_600_123));
    }

    #[test]
    fn deserializes_from_float() {
        let ts: EpochMillis = serde_json::from_str("1714566600123.0").unwrap();
        assert_eq!(ts, EpochMillis::new(1_714_566_600_123));

        let ts: EpochMillis = serde_json::from_str("1714566600123.9").unwrap();
        assert_eq!(ts, EpochMillis::new(1_714_566_600_123));
    }

    #[test]
    fn rejects_non_numbers_and_huge_floats() {
        assert!(serde_json::from_str::<EpochMillis>("\"1714566600123\"").is_err());
        assert!(serde_json::from_str::<EpochMillis>("1e300").is_err());
    }
}

//! # Stored Timestamp Encoding
//!
//! Timestamps inside documents are RFC 3339 UTC strings with exactly three
//! fractional digits, e.g. `2024-01-02T08:00:00.000Z`.
//!
//! ## Why Fixed Width?
//! The document store compares timestamps as text when it evaluates range
//! filters (`date >= start_of_day`) and `ORDER BY arrival_time DESC`.
//! chrono's default encoding drops trailing fractional digits, which breaks
//! lexicographic order within the same second:
//!
//! ```text
//! "08:00:00Z"      vs  "08:00:00.5Z"     → 'Z' > '.'  (wrong order)
//! "08:00:00.000Z"  vs  "08:00:00.500Z"   → '0' < '5'  (correct)
//! ```
//!
//! ## Usage
//! ```rust
//! use chrono::{DateTime, Utc};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Doc {
//!     #[serde(default, with = "fleet_core::timestamp::option")]
//!     start_time: Option<DateTime<Utc>>,
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Formats a timestamp in the stored encoding.
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses any RFC 3339 timestamp (not only the stored encoding).
pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

/// Same encoding for `Option<DateTime<Utc>>`; `None` is written as `null`.
pub mod option {
    use super::*;

    pub fn serialize<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ts {
            Some(ts) => serializer.serialize_some(&format(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(500);

        assert_eq!(format(&a), "2024-01-02T08:00:00.000Z");
        assert_eq!(format(&b), "2024-01-02T08:00:00.500Z");
        assert!(format(&a) < format(&b));
    }

    #[test]
    fn test_parse_accepts_offsets() {
        let ts = parse("2024-01-02T10:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap());
    }
}

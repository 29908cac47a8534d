//! Zone-aware date values carried by date tokens.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::options::DateTimeHandling;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A calendar instant together with how its zone is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeValue {
    Utc(DateTime<Utc>),
    Local(DateTime<Local>),
    /// Wall-clock time with no zone; treated as UTC when an instant is needed.
    Unspecified(NaiveDateTime),
}

impl DateTimeValue {
    /// BSON datetimes are UTC milliseconds since the epoch. `None` when the
    /// value is outside chrono's range.
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(DateTimeValue::Utc)
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.to_utc().timestamp_millis()
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            DateTimeValue::Utc(value) => *value,
            DateTimeValue::Local(value) => value.with_timezone(&Utc),
            DateTimeValue::Unspecified(value) => value.and_utc(),
        }
    }

    pub fn with_handling(self, handling: DateTimeHandling) -> Self {
        match handling {
            DateTimeHandling::RoundtripKind => self,
            DateTimeHandling::Utc => DateTimeValue::Utc(self.to_utc()),
            DateTimeHandling::Local => DateTimeValue::Local(self.to_utc().with_timezone(&Local)),
            DateTimeHandling::Unspecified => DateTimeValue::Unspecified(match self {
                DateTimeValue::Utc(value) => value.naive_utc(),
                DateTimeValue::Local(value) => value.naive_local(),
                DateTimeValue::Unspecified(value) => value,
            }),
        }
    }

    /// Parses RFC 3339 text (a `Z` suffix is UTC, any other offset local)
    /// or a zone-less ISO-8601 date or date-time.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(value) = DateTime::parse_from_rfc3339(text) {
            return Some(if text.ends_with(['Z', 'z']) {
                DateTimeValue::Utc(value.with_timezone(&Utc))
            } else {
                DateTimeValue::Local(value.with_timezone(&Local))
            });
        }
        for format in NAIVE_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
                return Some(DateTimeValue::Unspecified(value));
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(DateTimeValue::Unspecified)
    }

    pub fn to_rfc3339(&self) -> String {
        match self {
            DateTimeValue::Utc(value) => value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            DateTimeValue::Local(value) => value.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            DateTimeValue::Unspecified(value) => {
                value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
            }
        }
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for DateTimeValue {
    fn from(value: DateTime<Utc>) -> Self {
        DateTimeValue::Utc(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn millis_roundtrip() {
        let value = DateTimeValue::from_millis(1_388_534_400_000).unwrap();
        assert_eq!(
            value,
            DateTimeValue::Utc(Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(value.timestamp_millis(), 1_388_534_400_000);
        assert_eq!(DateTimeValue::from_millis(i64::MAX), None);
    }

    #[test]
    fn parses_zoned_and_naive_text() {
        assert_eq!(
            DateTimeValue::parse("2014-01-01T00:00:00Z"),
            DateTimeValue::from_millis(1_388_534_400_000)
        );
        let shifted = DateTimeValue::parse("2014-01-01T02:00:00+02:00").unwrap();
        assert!(matches!(shifted, DateTimeValue::Local(_)));
        assert_eq!(shifted.timestamp_millis(), 1_388_534_400_000);

        let naive = DateTimeValue::parse("2014-01-01 00:00:00").unwrap();
        assert!(matches!(naive, DateTimeValue::Unspecified(_)));
        assert_eq!(naive.timestamp_millis(), 1_388_534_400_000);
        assert_eq!(DateTimeValue::parse("2014-01-01"), Some(naive));
        assert_eq!(DateTimeValue::parse("yesterday"), None);
    }

    #[test]
    fn handling_preserves_the_instant() {
        let utc = DateTimeValue::from_millis(1_000).unwrap();
        for handling in [
            DateTimeHandling::RoundtripKind,
            DateTimeHandling::Utc,
            DateTimeHandling::Local,
        ] {
            assert_eq!(utc.with_handling(handling).timestamp_millis(), 1_000);
        }
        let stripped = utc.with_handling(DateTimeHandling::Unspecified);
        assert!(matches!(stripped, DateTimeValue::Unspecified(_)));
        assert_eq!(stripped.timestamp_millis(), 1_000);
    }

    #[test]
    fn formats_rfc3339() {
        let value = DateTimeValue::from_millis(1_388_534_400_500).unwrap();
        assert_eq!(value.to_rfc3339(), "2014-01-01T00:00:00.500Z");
        assert_eq!(
            value.with_handling(DateTimeHandling::Unspecified).to_string(),
            "2014-01-01T00:00:00.500"
        );
    }
}

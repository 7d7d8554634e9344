use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KanbanError;

/// Civil date (`YYYY-MM-DD`) with no time zone attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Date)
    }

    /// Parse a strict `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> Result<Self, KanbanError> {
        let s = s.trim();
        // chrono accepts single-digit fields; the on-disk form does not
        let shape_ok = s.len() == 10
            && s.char_indices().all(|(i, c)| {
                if i == 4 || i == 7 {
                    c == '-'
                } else {
                    c.is_ascii_digit()
                }
            });
        if !shape_ok {
            return Err(KanbanError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|_| KanbanError::InvalidDate(s.to_string()))
    }

    pub fn today() -> Self {
        Date(Local::now().date_naive())
    }

    pub fn naive(self) -> NaiveDate {
        self.0
    }

    /// True when local midnight at the start of this date is earlier than `instant`.
    pub fn before(self, instant: DateTime<Utc>) -> bool {
        let midnight = self.0.and_hms_opt(0, 0, 0).unwrap_or_default();
        match Local.from_local_datetime(&midnight).earliest() {
            Some(local) => local.with_timezone(&Utc) < instant,
            // Midnight skipped by a DST jump: compare calendar days instead
            None => self.0 < instant.with_timezone(&Local).date_naive(),
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Date {
    type Err = KanbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format() {
        let d = Date::parse("2026-03-15").unwrap();
        assert_eq!(d.to_string(), "2026-03-15");
        assert_eq!(d, Date::new(2026, 3, 15).unwrap());
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["2026-3-15", "15-03-2026", "2026-02-30", "", "tomorrow", "2026/03/15"] {
            assert!(Date::parse(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn ordering_is_chronological() {
        let a = Date::parse("2025-12-31").unwrap();
        let b = Date::parse("2026-01-01").unwrap();
        assert!(a < b);
    }

    #[test]
    fn before_instant() {
        let d = Date::parse("2020-01-01").unwrap();
        assert!(d.before(Utc::now()));
        let future = Date::parse("2999-01-01").unwrap();
        assert!(!future.before(Utc::now()));
    }
}

//! Business calendar types
//!
//! The shop trades on local (WIB) calendar days: transaction codes, report
//! ranges and payroll months are all expressed in the shop's timezone while
//! timestamps are stored in UTC.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Invalid month: {0}")]
    InvalidMonth(String),
}

/// Timezone wrapper for the shop's business calendar
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Timezone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s.trim())
            .map(Timezone)
            .map_err(|_| CoreError::UnknownTimezone(s.to_string()))
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Calendar date of a UTC instant in this timezone
    pub fn business_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        utc.with_timezone(&self.0).date_naive()
    }

    /// Gets the start of day (00:00:00) in this timezone as UTC
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(NaiveTime::MIN);
        self.0
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }

    /// Gets the start of the following day in this timezone as UTC
    ///
    /// Used as the exclusive upper bound of a day range.
    pub fn start_of_next_day(&self, date: NaiveDate) -> DateTime<Utc> {
        match date.succ_opt() {
            Some(next) => self.start_of_day(next),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::Asia::Jakarta)
    }
}

/// An inclusive range of business days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// A single day
    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// The whole of a calendar month
    pub fn month(year: i32, month: u32) -> Result<Self, TemporalError> {
        PayrollPeriod::new(year, month).map(|p| p.date_range())
    }

    /// The whole of a calendar year
    pub fn year(year: i32) -> Result<Self, TemporalError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| TemporalError::InvalidMonth(format!("{}-01", year)))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| TemporalError::InvalidMonth(format!("{}-12", year)))?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days covered, inclusive of both ends
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// UTC half-open bounds `[start, end)` for the range in the given timezone
    pub fn utc_bounds(&self, tz: &Timezone) -> (DateTime<Utc>, DateTime<Utc>) {
        (tz.start_of_day(self.start), tz.start_of_next_day(self.end))
    }
}

/// A payroll month, formatted `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PayrollPeriod {
    year: i32,
    month: u32,
}

impl PayrollPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, TemporalError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(TemporalError::InvalidMonth(format!("{}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// The month containing the given date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month
    pub fn end(&self) -> NaiveDate {
        self.start()
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start(),
            end: self.end(),
        }
    }

    /// The following month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for PayrollPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PayrollPeriod {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| TemporalError::InvalidMonth(s.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| TemporalError::InvalidMonth(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| TemporalError::InvalidMonth(s.to_string()))?;
        Self::new(year, month)
    }
}

impl Serialize for PayrollPeriod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PayrollPeriod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_date_uses_jakarta_offset() {
        let tz = Timezone::default();
        // 2024-03-31 18:30 UTC is already 2024-04-01 01:30 WIB
        let utc = Utc.with_ymd_and_hms(2024, 3, 31, 18, 30, 0).unwrap();
        assert_eq!(tz.business_date(utc), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn test_payroll_period_bounds() {
        let feb = PayrollPeriod::new(2024, 2).unwrap();
        assert_eq!(feb.start(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.end(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb.to_string(), "2024-02");
    }

    #[test]
    fn test_payroll_period_parse() {
        let period: PayrollPeriod = "2025-12".parse().unwrap();
        assert_eq!(period.next().to_string(), "2026-01");
        assert!("2025-13".parse::<PayrollPeriod>().is_err());
        assert!("garbage".parse::<PayrollPeriod>().is_err());
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(DateRange::new(a, b).is_err());
        assert_eq!(DateRange::new(b, a).unwrap().days(), 2);
    }
}

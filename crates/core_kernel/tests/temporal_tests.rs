//! Unit tests for the business calendar types

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::temporal::TemporalError;
use core_kernel::{DateRange, PayrollPeriod, Timezone};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod date_range {
    use super::*;

    #[test]
    fn test_month_range_covers_whole_month() {
        let range = DateRange::month(2023, 2).unwrap();
        assert_eq!(range.start, date(2023, 2, 1));
        assert_eq!(range.end, date(2023, 2, 28));
        assert_eq!(range.days(), 28);
    }

    #[test]
    fn test_year_range() {
        let range = DateRange::year(2024).unwrap();
        assert_eq!(range.days(), 366);
        assert!(range.contains(date(2024, 7, 17)));
        assert!(!range.contains(date(2025, 1, 1)));
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::day(date(2024, 1, 15));
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn test_invalid_range() {
        let result = DateRange::new(date(2024, 2, 1), date(2024, 1, 1));
        assert!(matches!(result, Err(TemporalError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_utc_bounds_follow_jakarta_midnight() {
        let tz = Timezone::default();
        let (start, end) = DateRange::day(date(2024, 1, 15)).utc_bounds(&tz);

        // WIB is UTC+7 with no daylight saving
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 14, 17, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 15, 17, 0, 0).unwrap());
    }
}

mod payroll_period {
    use super::*;

    #[test]
    fn test_containing_date() {
        let period = PayrollPeriod::containing(date(2024, 8, 17));
        assert_eq!(period.to_string(), "2024-08");
    }

    #[test]
    fn test_rejects_month_zero() {
        assert!(PayrollPeriod::new(2024, 0).is_err());
    }

    #[test]
    fn test_serde_uses_yyyy_mm() {
        let period = PayrollPeriod::new(2024, 3).unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"2024-03\"");

        let back: PayrollPeriod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = PayrollPeriod::new(2023, 12).unwrap();
        let b = PayrollPeriod::new(2024, 1).unwrap();
        assert!(a < b);
        assert_eq!(a.next(), b);
    }
}

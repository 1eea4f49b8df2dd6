//! Tests for reference periods and date parsing

use chrono::NaiveDate;
use core_kernel::temporal::{parse_date, format_date};
use core_kernel::{ReferencePeriod, TemporalError};

mod periods {
    use super::*;

    #[test]
    fn test_period_containing_date() {
        let period = ReferencePeriod::containing(NaiveDate::from_ymd_opt(2025, 10, 31).unwrap());
        assert_eq!(period, ReferencePeriod::new(10, 2025).unwrap());
    }

    #[test]
    fn test_periods_order_by_year_then_month() {
        let dec_2024 = ReferencePeriod::new(12, 2024).unwrap();
        let jan_2025 = ReferencePeriod::new(1, 2025).unwrap();
        assert!(dec_2024 < jan_2025);
    }

    #[test]
    fn test_invalid_month_message_names_the_period() {
        let err = ReferencePeriod::new(14, 2025).unwrap_err();
        assert_eq!(err, TemporalError::InvalidMonth { month: 14, year: 2025 });
        assert!(err.to_string().contains("14/2025"));
    }

    #[test]
    fn test_date_format_roundtrip() {
        let date = NaiveDate::from_ymd_opt(1941, 2, 3).unwrap();
        assert_eq!(parse_date(&format_date(date)).unwrap(), date);
    }
}

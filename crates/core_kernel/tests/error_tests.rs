//! Tests for the kernel error type

use core_kernel::{CoreError, MoneyError, PayrollPeriod, TemporalError, Timezone, UserId};

fn parse_period(s: &str) -> Result<PayrollPeriod, CoreError> {
    Ok(s.parse::<PayrollPeriod>()?)
}

#[test]
fn test_period_errors_convert_with_question_mark() {
    let error = parse_period("2024-13").unwrap_err();

    assert!(matches!(error, CoreError::Temporal(TemporalError::InvalidMonth(_))));
    assert!(error.to_string().contains("2024-13"));
}

#[test]
fn test_money_errors_are_transparent() {
    let error: CoreError = MoneyError::DivisionByZero.into();

    assert_eq!(error.to_string(), MoneyError::DivisionByZero.to_string());
}

#[test]
fn test_identifier_errors_convert() {
    fn parse_user(s: &str) -> Result<UserId, CoreError> {
        Ok(s.parse::<UserId>()?)
    }

    assert!(matches!(parse_user("kasir-1"), Err(CoreError::Identifier(_))));
    assert!(parse_user(&UserId::new().to_string()).is_ok());
}

#[test]
fn test_timezone_names_parse() {
    let jakarta: Timezone = "Asia/Jakarta".parse().unwrap();
    let error = "Asia/Atlantis".parse::<Timezone>().unwrap_err();

    assert_eq!(jakarta, Timezone::default());
    assert_eq!(jakarta.to_string(), "Asia/Jakarta");
    assert!(matches!(error, CoreError::UnknownTimezone(name) if name == "Asia/Atlantis"));
}

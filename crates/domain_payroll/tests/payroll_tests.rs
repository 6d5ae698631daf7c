//! Tests for domain_payroll

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Money, PayrollPeriod, Rate, TransactionId, UserId};

use domain_payroll::{
    calculate, payroll_code, Employee, EmployeeRole, PayrollConfig, PayrollError, PayrollRecord,
    PayrollStatus, RoleSalary,
};

fn june() -> PayrollPeriod {
    PayrollPeriod::new(2024, 6).unwrap()
}

fn approved_record() -> PayrollRecord {
    let employee = Employee::new(UserId::new(), "Rahmat", EmployeeRole::Driver);
    let breakdown = calculate(&employee, june(), &PayrollConfig::default());
    let mut record = PayrollRecord::draft(payroll_code(june(), 2), employee.user_id, breakdown);
    record.approve(UserId::new()).unwrap();
    record
}

// ============================================================================
// Calculator Tests
// ============================================================================

mod calculator_tests {
    use super::*;

    #[test]
    fn test_fallback_role_table_is_used() {
        let employee = Employee::new(UserId::new(), "Rahmat", EmployeeRole::Driver);
        let breakdown = calculate(&employee, june(), &PayrollConfig::default());

        assert_eq!(breakdown.basic_salary, RoleSalary::fallback(EmployeeRole::Driver).base_salary);
        assert_eq!(breakdown.allowance_amount, Money::from_rupiah(400_000));
    }

    #[test]
    fn test_overtime_and_bonus_are_zero() {
        let employee = Employee::new(UserId::new(), "Rahmat", EmployeeRole::Driver);
        let breakdown = calculate(&employee, june(), &PayrollConfig::default());

        assert_eq!(breakdown.overtime_hours, Decimal::ZERO);
        assert_eq!(breakdown.overtime_amount, Money::ZERO);
        assert_eq!(breakdown.bonus_amount, Money::ZERO);
        assert!(!breakdown.notes.is_empty());
    }

    #[test]
    fn test_other_deductions_reduce_net() {
        let employee = Employee::new(UserId::new(), "Rahmat", EmployeeRole::Driver)
            .with_other_deductions(Money::from_rupiah(250_000));
        let breakdown = calculate(&employee, june(), &PayrollConfig::default());

        assert_eq!(
            breakdown.net_salary,
            breakdown.gross_salary - breakdown.insurance_amount - Money::from_rupiah(250_000)
        );
    }

    #[test]
    fn test_breakdown_serializes_period_as_month() {
        let employee = Employee::new(UserId::new(), "Rahmat", EmployeeRole::Driver);
        let breakdown = calculate(&employee, june(), &PayrollConfig::default());
        let json = serde_json::to_value(&breakdown).unwrap();

        assert_eq!(json["period"], "2024-06");
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_record_copies_breakdown_totals() {
        let record = approved_record();
        assert_eq!(record.gross_salary, record.breakdown.gross_salary);
        assert_eq!(record.net_salary, record.breakdown.net_salary);
        assert_eq!(record.period_start.to_string(), "2024-06-01");
        assert_eq!(record.period_end.to_string(), "2024-06-30");
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_paid_record_is_terminal() {
        let mut record = approved_record();
        record.mark_paid(TransactionId::new(), UserId::new()).unwrap();

        assert!(record.status.is_terminal());
        assert!(matches!(
            record.mark_paid(TransactionId::new(), UserId::new()),
            Err(PayrollError::NotApproved { .. })
        ));
    }

    #[test]
    fn test_approved_can_be_cancelled() {
        let mut record = approved_record();
        record.cancel(None).unwrap();
        assert_eq!(record.status, PayrollStatus::Cancelled);
    }

    #[test]
    fn test_tampered_totals_block_payment() {
        let mut record = approved_record();
        record.net_salary = record.net_salary + Money::from_rupiah(1);

        assert!(matches!(
            record.ensure_payable(),
            Err(PayrollError::InconsistentTotals(_))
        ));
    }

    #[test]
    fn test_negative_net_blocks_payment() {
        let employee = Employee::new(UserId::new(), "Rahmat", EmployeeRole::Driver)
            .with_other_deductions(Money::from_rupiah(10_000_000));
        let breakdown = calculate(&employee, june(), &PayrollConfig::default());
        let mut record = PayrollRecord::draft(payroll_code(june(), 3), employee.user_id, breakdown);
        record.approve(UserId::new()).unwrap();

        assert!(matches!(
            record.ensure_payable(),
            Err(PayrollError::NegativeNetSalary { .. })
        ));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("approved".parse::<PayrollStatus>(), Ok(PayrollStatus::Approved));
        assert!("void".parse::<PayrollStatus>().is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_breakdown_always_balances(
        base in 0i64..50_000_000,
        allowance in 0i64..5_000_000,
        other in 0i64..2_000_000,
        tax_pct in 0u32..30,
        insurance_pct in 0u32..10
    ) {
        let employee = Employee::new(UserId::new(), "Any", EmployeeRole::Admin)
            .with_base_salary(Money::from_rupiah(base))
            .with_allowance(Money::from_rupiah(allowance))
            .with_other_deductions(Money::from_rupiah(other));
        let config = PayrollConfig::default()
            .with_tax(Money::from_rupiah(4_500_000), Rate::from_percentage(Decimal::from(tax_pct)))
            .with_insurance(Rate::from_percentage(Decimal::from(insurance_pct)), Money::from_rupiah(12_000_000));

        let breakdown = calculate(&employee, june(), &config);

        prop_assert!(breakdown.is_balanced());
        prop_assert!(breakdown.tax_amount >= Money::ZERO);
        prop_assert!(breakdown.insurance_base <= Money::from_rupiah(12_000_000));
        if breakdown.gross_salary <= Money::from_rupiah(4_500_000) {
            prop_assert_eq!(breakdown.tax_amount, Money::ZERO);
        }
    }
}

#[test]
fn test_default_rates() {
    let config = PayrollConfig::default();
    assert_eq!(config.tax_rate.as_decimal(), dec!(0.05));
    assert_eq!(config.insurance_rate.as_decimal(), dec!(0.01));
}

//! Property tests for the payroll line calculator.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::calculator::{PayrollLineInput, calculate};
use super::types::ContractType;
use super::validation::{FinalizationCandidate, IssueKind, entry_issues};
use safra_shared::types::PayrollEntryId;

/// Non-negative money with two decimal places, up to 99 999.99.
fn arb_money() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Non-negative hours with one decimal place.
fn arb_hours() -> impl Strategy<Value = Decimal> {
    (0i64..2_000).prop_map(|tenths| Decimal::new(tenths, 1))
}

fn arb_contract() -> impl Strategy<Value = ContractType> {
    prop_oneof![Just(ContractType::Mensalista), Just(ContractType::Diarista)]
}

prop_compose! {
    fn arb_input()(
        contract_type in arb_contract(),
        base_salary in arb_money(),
        daily_rate in arb_money(),
        days_worked in 0u32..=16,
        overtime_hours in arb_hours(),
        overtime_rate in arb_money(),
        cost_allowance in arb_money(),
        extras in arb_money(),
        advance_deduction in arb_money(),
    ) -> PayrollLineInput {
        PayrollLineInput {
            contract_type,
            base_salary,
            daily_rate,
            days_worked,
            overtime_hours,
            overtime_rate,
            cost_allowance,
            extras,
            advance_deduction,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// 0 <= net <= gross for any valid input.
    #[test]
    fn prop_net_between_zero_and_gross(input in arb_input()) {
        prop_assert!(input.validate().is_ok());
        let amounts = calculate(&input).unwrap();
        prop_assert!(amounts.net_amount >= Decimal::ZERO);
        prop_assert!(amounts.net_amount <= amounts.gross_amount);
    }

    /// Day workers earn at least their days, whatever else is added.
    #[test]
    fn prop_daily_gross_at_least_rate_times_days(
        daily_rate in arb_money(),
        days_worked in 1u32..=16,
    ) {
        let input = PayrollLineInput {
            contract_type: ContractType::Diarista,
            daily_rate,
            days_worked,
            ..Default::default()
        };
        let amounts = calculate(&input).unwrap();
        prop_assert!(amounts.gross_amount >= daily_rate * Decimal::from(days_worked));
    }

    /// Monthly pay does not depend on days worked.
    #[test]
    fn prop_monthly_ignores_days(base_salary in arb_money(), days in 0u32..=16) {
        let a = calculate(&PayrollLineInput {
            base_salary,
            days_worked: days,
            ..Default::default()
        })
        .unwrap();
        let b = calculate(&PayrollLineInput {
            base_salary,
            days_worked: 15,
            ..Default::default()
        })
        .unwrap();
        prop_assert_eq!(a, b);
    }

    /// Advances above gross block finalization and floor net at zero.
    #[test]
    fn prop_advance_above_gross_blocks(input in arb_input(), excess in 1i64..100_000) {
        let gross = calculate(&input).unwrap().gross_amount;
        let input = PayrollLineInput {
            advance_deduction: gross + Decimal::new(excess, 2),
            ..input
        };
        let amounts = calculate(&input).unwrap();
        prop_assert_eq!(amounts.net_amount, Decimal::ZERO);

        let problems = entry_issues(&FinalizationCandidate {
            entry_id: PayrollEntryId::new(),
            employee_name: "x".to_string(),
            days_worked: input.days_worked.max(1),
            gross_amount: amounts.gross_amount,
            advance_deduction: input.advance_deduction,
        });
        let blocked = problems
            .iter()
            .any(|p| matches!(p, IssueKind::AdvanceExceedsGross { .. }));
        prop_assert!(blocked);
    }

    /// Zero days worked always blocks finalization.
    #[test]
    fn prop_zero_days_blocks(input in arb_input()) {
        let amounts = calculate(&input).unwrap();
        let problems = entry_issues(&FinalizationCandidate {
            entry_id: PayrollEntryId::new(),
            employee_name: "x".to_string(),
            days_worked: 0,
            gross_amount: amounts.gross_amount,
            advance_deduction: input.advance_deduction,
        });
        prop_assert!(problems.contains(&IssueKind::ZeroDaysWorked));
    }
}

#[test]
fn monthly_two_thousand_is_one_thousand_per_quinzena() {
    let amounts = calculate(&PayrollLineInput {
        contract_type: ContractType::Mensalista,
        base_salary: dec!(2000),
        days_worked: 15,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(amounts.gross_amount, dec!(1000));
    assert_eq!(amounts.net_amount, dec!(1000));
}

//! Payroll line calculator.
//!
//! The single implementation of the gross/net formula. Entry persistence,
//! the preview endpoint and the client all call [`calculate`]; nothing else
//! may re-derive these amounts.

use rust_decimal::Decimal;
use safra_shared::types::{floor_zero, round_cents};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::PayrollError;
use super::types::ContractType;

/// Longest quinzena: the 16th to the 31st.
pub const MAX_DAYS_PER_PERIOD: u32 = safra_shared::config::MAX_PERIOD_DAYS;

/// Largest amount a money column holds, `NUMERIC(14, 2)`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Largest overtime figure, `NUMERIC(8, 2)`.
pub const MAX_OVERTIME_HOURS: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

/// Inputs of one payroll line. Missing numeric fields are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayrollLineInput {
    /// Contract type of the employee.
    pub contract_type: ContractType,
    /// Monthly salary (MENSALISTA).
    #[serde(deserialize_with = "zero_if_null")]
    pub base_salary: Decimal,
    /// Day rate (DIARISTA).
    #[serde(deserialize_with = "zero_if_null")]
    pub daily_rate: Decimal,
    /// Days worked in the period.
    #[serde(deserialize_with = "zero_if_null")]
    pub days_worked: u32,
    /// Overtime hours.
    #[serde(deserialize_with = "zero_if_null")]
    pub overtime_hours: Decimal,
    /// Value of one overtime hour.
    #[serde(deserialize_with = "zero_if_null")]
    pub overtime_rate: Decimal,
    /// Cost allowance (ajuda de custo).
    #[serde(deserialize_with = "zero_if_null")]
    pub cost_allowance: Decimal,
    /// Extras and bonuses.
    #[serde(deserialize_with = "zero_if_null")]
    pub extras: Decimal,
    /// Total advance deduction (linked installments plus avulso).
    #[serde(deserialize_with = "zero_if_null")]
    pub advance_deduction: Decimal,
}

/// Amounts derived from a [`PayrollLineInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollAmounts {
    /// Day rate × days (DIARISTA) or half the monthly salary (MENSALISTA).
    pub base_component: Decimal,
    /// Overtime hours × overtime rate.
    pub overtime_amount: Decimal,
    /// Gross amount, floored at zero.
    pub gross_amount: Decimal,
    /// Gross minus advances, floored at zero.
    pub net_amount: Decimal,
}

impl PayrollLineInput {
    /// Checks the non-negativity constraints on every numeric field, the
    /// storable magnitudes and the days range.
    ///
    /// Reports the first offending field by its wire name.
    pub fn validate(&self) -> Result<(), PayrollError> {
        if self.days_worked > MAX_DAYS_PER_PERIOD {
            return Err(PayrollError::DaysOutOfRange {
                days: self.days_worked,
                max: MAX_DAYS_PER_PERIOD,
            });
        }
        let fields = [
            ("baseSalary", self.base_salary),
            ("dailyRate", self.daily_rate),
            ("overtimeHours", self.overtime_hours),
            ("overtimeRate", self.overtime_rate),
            ("costAllowance", self.cost_allowance),
            ("extras", self.extras),
            ("advanceDeduction", self.advance_deduction),
        ];
        for &(field, value) in &fields {
            if value < Decimal::ZERO {
                return Err(PayrollError::NegativeValue { field });
            }
        }
        if self.overtime_hours > MAX_OVERTIME_HOURS {
            return Err(PayrollError::AmountOutOfRange {
                field: "overtimeHours",
            });
        }
        match fields.iter().find(|(_, value)| *value > MAX_AMOUNT) {
            Some(&(field, _)) => Err(PayrollError::AmountOutOfRange { field }),
            None => Ok(()),
        }
    }
}

/// Computes gross and net for one payroll line.
///
/// Negative intermediate results are floored at zero, never reported.
///
/// # Errors
///
/// Returns `AmountOutOfRange` naming the first figure that overflows or does
/// not fit a money column.
pub fn calculate(input: &PayrollLineInput) -> Result<PayrollAmounts, PayrollError> {
    let base_component = match input.contract_type {
        ContractType::Diarista => input.daily_rate.checked_mul(Decimal::from(input.days_worked)),
        ContractType::Mensalista => input.base_salary.checked_div(Decimal::TWO),
    }
    .ok_or(PayrollError::AmountOutOfRange {
        field: "baseComponent",
    })?;
    let overtime_amount = input
        .overtime_hours
        .checked_mul(input.overtime_rate)
        .ok_or(PayrollError::AmountOutOfRange {
            field: "overtimeAmount",
        })?;

    let gross = [input.cost_allowance, overtime_amount, input.extras]
        .into_iter()
        .try_fold(base_component, Decimal::checked_add)
        .map(|sum| round_cents(floor_zero(sum)))
        .filter(|gross| *gross <= MAX_AMOUNT)
        .ok_or(PayrollError::AmountOutOfRange {
            field: "grossAmount",
        })?;
    let net_amount = gross
        .checked_sub(input.advance_deduction)
        .map(|net| round_cents(floor_zero(net)))
        .ok_or(PayrollError::AmountOutOfRange { field: "netAmount" })?;

    Ok(PayrollAmounts {
        base_component: round_cents(base_component),
        overtime_amount: round_cents(overtime_amount),
        gross_amount: gross,
        net_amount,
    })
}

fn zero_if_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_half_salary() {
        let input = PayrollLineInput {
            contract_type: ContractType::Mensalista,
            base_salary: dec!(2000),
            days_worked: 15,
            ..Default::default()
        };
        let amounts = calculate(&input).unwrap();
        assert_eq!(amounts.gross_amount, dec!(1000));
        assert_eq!(amounts.net_amount, dec!(1000));
    }

    #[test]
    fn test_daily_rate_times_days() {
        let input = PayrollLineInput {
            contract_type: ContractType::Diarista,
            daily_rate: dec!(120.50),
            days_worked: 12,
            ..Default::default()
        };
        let amounts = calculate(&input).unwrap();
        assert_eq!(amounts.base_component, dec!(1446.00));
        assert_eq!(amounts.gross_amount, dec!(1446.00));
    }

    #[test]
    fn test_all_components_and_advance() {
        let input = PayrollLineInput {
            contract_type: ContractType::Diarista,
            daily_rate: dec!(100),
            days_worked: 10,
            overtime_hours: dec!(4.5),
            overtime_rate: dec!(20),
            cost_allowance: dec!(50),
            extras: dec!(25),
            advance_deduction: dec!(300),
            ..Default::default()
        };
        let amounts = calculate(&input).unwrap();
        assert_eq!(amounts.overtime_amount, dec!(90));
        assert_eq!(amounts.gross_amount, dec!(1165));
        assert_eq!(amounts.net_amount, dec!(865));
    }

    #[test]
    fn test_advance_larger_than_gross_floors_net() {
        let input = PayrollLineInput {
            base_salary: dec!(1000),
            days_worked: 15,
            advance_deduction: dec!(800),
            ..Default::default()
        };
        let amounts = calculate(&input).unwrap();
        assert_eq!(amounts.gross_amount, dec!(500));
        assert_eq!(amounts.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_negative_inputs_are_floored_not_reported() {
        let input = PayrollLineInput {
            contract_type: ContractType::Diarista,
            extras: dec!(-500),
            ..Default::default()
        };
        let amounts = calculate(&input).unwrap();
        assert_eq!(amounts.gross_amount, Decimal::ZERO);
        assert_eq!(amounts.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_odd_cent_salary_rounds_half_up() {
        let input = PayrollLineInput {
            base_salary: dec!(1000.01),
            ..Default::default()
        };
        assert_eq!(calculate(&input).unwrap().gross_amount, dec!(500.01));
    }

    #[test]
    fn test_validate_reports_first_negative_field() {
        let input = PayrollLineInput {
            overtime_hours: dec!(-1),
            extras: dec!(-2),
            ..Default::default()
        };
        assert!(matches!(
            input.validate(),
            Err(PayrollError::NegativeValue { field: "overtimeHours" })
        ));
        assert!(PayrollLineInput::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_more_days_than_a_quinzena() {
        let input = PayrollLineInput {
            days_worked: 17,
            ..Default::default()
        };
        assert!(matches!(
            input.validate(),
            Err(PayrollError::DaysOutOfRange { days: 17, max: 16 })
        ));
    }

    #[test]
    fn test_missing_and_null_fields_are_zero() {
        let input: PayrollLineInput = serde_json::from_str(
            r#"{"contractType":"DIARISTA","dailyRate":80,"daysWorked":5,"extras":null}"#,
        )
        .unwrap();
        assert_eq!(input.extras, Decimal::ZERO);
        assert_eq!(input.advance_deduction, Decimal::ZERO);
        assert_eq!(calculate(&input).unwrap().gross_amount, dec!(400));
    }

    #[test]
    fn test_huge_overtime_is_rejected_not_overflowed() {
        let input: PayrollLineInput = serde_json::from_str(
            r#"{"contractType":"DIARISTA","overtimeHours":1000000000000000,"overtimeRate":1000000000000000}"#,
        )
        .unwrap();
        assert!(matches!(
            input.validate(),
            Err(PayrollError::AmountOutOfRange { field: "overtimeHours" })
        ));
        assert!(matches!(
            calculate(&input),
            Err(PayrollError::AmountOutOfRange { field: "overtimeAmount" })
        ));
    }

    #[test]
    fn test_gross_above_column_limit_is_rejected() {
        let input = PayrollLineInput {
            contract_type: ContractType::Diarista,
            daily_rate: MAX_AMOUNT,
            days_worked: 16,
            ..Default::default()
        };
        assert!(input.validate().is_ok());
        assert!(matches!(
            calculate(&input),
            Err(PayrollError::AmountOutOfRange { field: "grossAmount" })
        ));
    }

    #[test]
    fn test_max_amount_matches_column() {
        assert_eq!(MAX_AMOUNT, dec!(999999999999.99));
        assert_eq!(MAX_OVERTIME_HOURS, dec!(999999.99));
        let input = PayrollLineInput {
            extras: MAX_AMOUNT + dec!(0.01),
            ..Default::default()
        };
        assert!(matches!(
            input.validate(),
            Err(PayrollError::AmountOutOfRange { field: "extras" })
        ));
    }
}

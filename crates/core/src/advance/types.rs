//! Advances (adiantamentos) and their installments (parcelas).

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use safra_shared::types::{AdvanceId, CENTS_SCALE, EmployeeId, InstallmentId, PayrollEntryId};
use serde::{Deserialize, Serialize};

use super::error::AdvanceError;

/// Upper bound on installments per advance.
pub const MAX_INSTALLMENTS: u32 = 24;

/// A salary advance granted to an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advance {
    /// Advance id.
    pub id: AdvanceId,
    /// Employee who received it.
    pub employee_id: EmployeeId,
    /// Amount paid out.
    pub total_amount: Decimal,
    /// Date it was paid.
    pub granted_on: NaiveDate,
    /// Free text.
    pub description: Option<String>,
}

/// One installment of an advance.
///
/// An installment is deducted from at most one payroll entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    /// Installment id.
    pub id: InstallmentId,
    /// Advance it belongs to.
    pub advance_id: AdvanceId,
    /// 1-based position.
    pub number: u32,
    /// Installment value.
    pub amount: Decimal,
    /// Entry it is deducted from, if any.
    pub entry_id: Option<PayrollEntryId>,
}

impl Installment {
    /// True once the installment is deducted from an entry.
    #[must_use]
    pub const fn is_deducted(&self) -> bool {
        self.entry_id.is_some()
    }
}

impl Advance {
    /// What the employee still owes: total minus installments already deducted.
    #[must_use]
    pub fn debt_balance(&self, installments: &[Installment]) -> Decimal {
        let deducted: Decimal = installments
            .iter()
            .filter(|i| i.advance_id == self.id && i.is_deducted())
            .map(|i| i.amount)
            .sum();
        self.total_amount - deducted
    }
}

/// Splits `total` into `count` equal installments.
///
/// Every installment is truncated to cents; the last one absorbs the
/// remainder so the values always add up to `total`.
///
/// # Errors
///
/// - `AdvanceError::NonPositiveAmount` if `total <= 0`
/// - `AdvanceError::InvalidInstallmentCount` if `count` is 0 or above [`MAX_INSTALLMENTS`]
pub fn split_installments(total: Decimal, count: u32) -> Result<Vec<Decimal>, AdvanceError> {
    if total <= Decimal::ZERO {
        return Err(AdvanceError::NonPositiveAmount);
    }
    if count == 0 || count > MAX_INSTALLMENTS {
        return Err(AdvanceError::InvalidInstallmentCount {
            count,
            max: MAX_INSTALLMENTS,
        });
    }

    let part = (total / Decimal::from(count))
        .round_dp_with_strategy(CENTS_SCALE, RoundingStrategy::ToZero);
    let mut parts = vec![part; count as usize];
    let leading: Decimal = part * Decimal::from(count - 1);
    if let Some(last) = parts.last_mut() {
        *last = total - leading;
    }
    Ok(parts)
}

//! Aggregate totals of a payroll.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-entry figures that feed the payroll totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFigures {
    /// Gross amount of the entry.
    pub gross_amount: Decimal,
    /// Advance deduction of the entry.
    pub advance_deduction: Decimal,
    /// Net amount of the entry.
    pub net_amount: Decimal,
}

/// Totals shown on the payroll header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollTotals {
    /// Number of entries.
    pub entry_count: u32,
    /// Sum of gross amounts.
    pub total_gross: Decimal,
    /// Sum of advance deductions.
    pub total_advances: Decimal,
    /// Sum of net amounts.
    pub total_net: Decimal,
}

impl PayrollTotals {
    /// Sums the figures of every entry.
    pub fn from_amounts<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = EntryFigures>,
    {
        entries
            .into_iter()
            .fold(Self::default(), |mut totals, entry| {
                totals.entry_count += 1;
                totals.total_gross += entry.gross_amount;
                totals.total_advances += entry.advance_deduction;
                totals.total_net += entry.net_amount;
                totals
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_totals_are_zero() {
        let totals = PayrollTotals::from_amounts(Vec::new());
        assert_eq!(totals, PayrollTotals::default());
    }

    #[test]
    fn test_sums_every_column() {
        let totals = PayrollTotals::from_amounts([
            EntryFigures {
                gross_amount: dec!(1000),
                advance_deduction: dec!(200),
                net_amount: dec!(800),
            },
            EntryFigures {
                gross_amount: dec!(450.50),
                advance_deduction: dec!(0),
                net_amount: dec!(450.50),
            },
        ]);
        assert_eq!(totals.entry_count, 2);
        assert_eq!(totals.total_gross, dec!(1450.50));
        assert_eq!(totals.total_advances, dec!(200));
        assert_eq!(totals.total_net, dec!(1250.50));
    }
}

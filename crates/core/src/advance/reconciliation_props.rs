//! Property tests for advance reconciliation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use safra_shared::types::{AdvanceId, InstallmentId, PayrollEntryId};
use uuid::Uuid;

use super::reconciliation::AdvanceSelection;
use super::types::{Installment, split_installments};

fn arb_money() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_installments() -> impl Strategy<Value = Vec<Installment>> {
    prop::collection::vec((any::<u128>(), arb_money()), 0..12).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (id, amount))| Installment {
                id: InstallmentId::from_uuid(Uuid::from_u128(id)),
                advance_id: AdvanceId::from_uuid(Uuid::nil()),
                number: u32::try_from(i + 1).unwrap_or(u32::MAX),
                amount,
                entry_id: None,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Total = sum(linked) + avulso, and survives a JSON round-trip unchanged.
    #[test]
    fn prop_total_is_sum_plus_loose(
        available in arb_installments(),
        mask in prop::collection::vec(any::<bool>(), 12),
        loose in arb_money(),
    ) {
        let entry = PayrollEntryId::new();
        let linked: Vec<&Installment> = available
            .iter()
            .zip(&mask)
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect();
        let selection = AdvanceSelection::new(linked.iter().map(|i| i.id), loose);

        // Duplicate generated ids collapse in the set; sum over the set.
        let expected: Decimal = available
            .iter()
            .filter(|i| selection.is_linked(i.id))
            .map(|i| i.amount)
            .sum::<Decimal>()
            + loose;
        let total = selection.deduction_total(entry, &available).unwrap();
        prop_assert_eq!(total, expected);

        let json = serde_json::to_string(&selection).unwrap();
        let reloaded: AdvanceSelection = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(reloaded.deduction_total(entry, &available).unwrap(), total);
    }

    /// Toggling the same installment twice restores the selection.
    #[test]
    fn prop_double_toggle_is_identity(
        available in arb_installments(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!available.is_empty());
        let id = available[pick.index(available.len())].id;
        let selection = AdvanceSelection::default();
        let back = selection.with_toggled(id).with_toggled(id);
        prop_assert_eq!(back, selection);
    }

    /// Installments always add up to the advance.
    #[test]
    fn prop_split_sums_to_total(cents in 1i64..10_000_000, count in 1u32..=24) {
        let total = Decimal::new(cents, 2);
        let parts = split_installments(total, count).unwrap();
        prop_assert_eq!(parts.len(), count as usize);
        prop_assert_eq!(parts.iter().copied().sum::<Decimal>(), total);
        prop_assert!(parts.iter().all(|p| *p >= Decimal::ZERO));
    }
}

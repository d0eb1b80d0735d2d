//! Reconciliation of advances against one payroll entry.
//!
//! An entry deducts a set of linked installments plus a loose ("avulso")
//! amount. The full resulting selection is what gets sent on every change.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use safra_shared::types::{InstallmentId, PayrollEntryId, round_cents};
use serde::{Deserialize, Serialize};

use super::error::AdvanceError;
use super::types::Installment;

/// Advances deducted from one payroll entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceSelection {
    /// Linked installments.
    #[serde(default)]
    pub installment_ids: BTreeSet<InstallmentId>,
    /// Loose amount not tied to any installment.
    #[serde(default)]
    pub loose_amount: Decimal,
}

impl AdvanceSelection {
    /// Creates a selection.
    pub fn new(
        installment_ids: impl IntoIterator<Item = InstallmentId>,
        loose_amount: Decimal,
    ) -> Self {
        Self {
            installment_ids: installment_ids.into_iter().collect(),
            loose_amount,
        }
    }

    /// Links or unlinks an installment. Returns true when it is now linked.
    pub fn toggle(&mut self, id: InstallmentId) -> bool {
        if self.installment_ids.remove(&id) {
            false
        } else {
            self.installment_ids.insert(id);
            true
        }
    }

    /// Returns a copy with `id` toggled, leaving `self` untouched.
    #[must_use]
    pub fn with_toggled(&self, id: InstallmentId) -> Self {
        let mut next = self.clone();
        next.toggle(id);
        next
    }

    /// Returns a copy with a different avulso amount.
    #[must_use]
    pub fn with_loose_amount(&self, loose_amount: Decimal) -> Self {
        Self {
            installment_ids: self.installment_ids.clone(),
            loose_amount,
        }
    }

    /// True if the installment is linked.
    #[must_use]
    pub fn is_linked(&self, id: InstallmentId) -> bool {
        self.installment_ids.contains(&id)
    }

    /// Checks the selection against the installments the entry may use.
    ///
    /// `available` holds every installment of the employee's advances. An
    /// installment already deducted from another entry cannot be linked.
    pub fn validate(
        &self,
        entry_id: PayrollEntryId,
        available: &[Installment],
    ) -> Result<(), AdvanceError> {
        if self.loose_amount < Decimal::ZERO {
            return Err(AdvanceError::NegativeLooseAmount);
        }
        for id in &self.installment_ids {
            let installment = available
                .iter()
                .find(|i| i.id == *id)
                .ok_or(AdvanceError::UnknownInstallment(*id))?;
            if let Some(owner) = installment.entry_id.filter(|owner| *owner != entry_id) {
                return Err(AdvanceError::InstallmentTaken {
                    installment_id: *id,
                    entry_id: owner,
                });
            }
        }
        Ok(())
    }

    /// Sum of the linked installment values found in `available`.
    #[must_use]
    pub fn linked_total(&self, available: &[Installment]) -> Decimal {
        available
            .iter()
            .filter(|i| self.is_linked(i.id))
            .map(|i| i.amount)
            .sum()
    }

    /// Validates the selection and returns the deduction for the entry:
    /// linked installments plus avulso.
    pub fn deduction_total(
        &self,
        entry_id: PayrollEntryId,
        available: &[Installment],
    ) -> Result<Decimal, AdvanceError> {
        self.validate(entry_id, available)?;
        Ok(round_cents(self.linked_total(available) + self.loose_amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use safra_shared::types::AdvanceId;

    fn installment(amount: Decimal, entry_id: Option<PayrollEntryId>) -> Installment {
        Installment {
            id: InstallmentId::new(),
            advance_id: AdvanceId::new(),
            number: 1,
            amount,
            entry_id,
        }
    }

    #[test]
    fn test_total_is_linked_plus_loose() {
        let entry = PayrollEntryId::new();
        let available = vec![
            installment(dec!(150), None),
            installment(dec!(80.50), Some(entry)),
            installment(dec!(999), None),
        ];
        let selection = AdvanceSelection::new([available[0].id, available[1].id], dec!(20));
        assert_eq!(
            selection.deduction_total(entry, &available).unwrap(),
            dec!(250.50)
        );
    }

    #[test]
    fn test_toggle_links_and_unlinks() {
        let id = InstallmentId::new();
        let mut selection = AdvanceSelection::default();
        assert!(selection.toggle(id));
        assert!(selection.is_linked(id));
        assert!(!selection.toggle(id));
        assert!(selection.installment_ids.is_empty());
    }

    #[test]
    fn test_with_toggled_leaves_original() {
        let selection = AdvanceSelection::default();
        let next = selection.with_toggled(InstallmentId::new());
        assert!(selection.installment_ids.is_empty());
        assert_eq!(next.installment_ids.len(), 1);
    }

    #[test]
    fn test_unknown_installment_rejected() {
        let stray = InstallmentId::new();
        let selection = AdvanceSelection::new([stray], Decimal::ZERO);
        assert_eq!(
            selection.deduction_total(PayrollEntryId::new(), &[]),
            Err(AdvanceError::UnknownInstallment(stray))
        );
    }

    #[test]
    fn test_installment_of_other_entry_rejected() {
        let other = PayrollEntryId::new();
        let available = vec![installment(dec!(100), Some(other))];
        let selection = AdvanceSelection::new([available[0].id], Decimal::ZERO);
        assert!(matches!(
            selection.validate(PayrollEntryId::new(), &available),
            Err(AdvanceError::InstallmentTaken { entry_id, .. }) if entry_id == other
        ));
    }

    #[test]
    fn test_negative_loose_rejected() {
        let selection = AdvanceSelection::new([], dec!(-1));
        assert_eq!(
            selection.validate(PayrollEntryId::new(), &[]),
            Err(AdvanceError::NegativeLooseAmount)
        );
    }

    #[test]
    fn test_json_shape() {
        let id = InstallmentId::new();
        let json = serde_json::to_value(AdvanceSelection::new([id], dec!(35.5))).unwrap();
        assert_eq!(json["installmentIds"][0], id.to_string());
        assert_eq!(json["looseAmount"], 35.5);

        let parsed: AdvanceSelection = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, AdvanceSelection::default());
    }
}

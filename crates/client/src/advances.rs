//! Advance selection of one payroll entry.
//!
//! Every link, unlink and avulso commit sends the whole resulting selection
//! in one PATCH. The confirmed state only changes when the server answers;
//! a failed round-trip is logged and leaves it as it was. The avulso text
//! box is local until [`AdvanceEditor::commit_loose`] is called.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use safra_core::advance::{AdvanceSelection, Installment};
use safra_shared::types::{InstallmentId, PayrollEntryId, PayrollId, format_brl, round_cents};

use crate::error::ClientError;

/// Advances state of an entry as the server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAdvancesView {
    /// Entry the state belongs to.
    pub entry_id: Uuid,
    /// Linked installments plus avulso.
    pub selection: AdvanceSelection,
    /// Installments the entry may link.
    pub available: Vec<Installment>,
    /// Sum of the linked installments.
    pub linked_total: Decimal,
    /// Deduction stored on the entry.
    pub deduction_total: Decimal,
    /// Recomputed entry amounts, after a change.
    #[serde(default)]
    pub entry: Option<EntryAmounts>,
}

/// Amounts of an entry after its deduction changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAmounts {
    /// Gross amount.
    pub gross_amount: Decimal,
    /// Total advance deduction.
    pub advance_deduction: Decimal,
    /// Net amount.
    pub net_amount: Decimal,
}

/// Round-trips for an entry's advances.
#[async_trait]
pub trait AdvanceSync: Send + Sync {
    /// Loads the current state.
    async fn fetch(
        &self,
        payroll_id: PayrollId,
        entry_id: PayrollEntryId,
    ) -> Result<EntryAdvancesView, ClientError>;

    /// Replaces the selection and returns the confirmed state.
    async fn save(
        &self,
        payroll_id: PayrollId,
        entry_id: PayrollEntryId,
        selection: &AdvanceSelection,
    ) -> Result<EntryAdvancesView, ClientError>;
}

/// Outcome of the last save, for the "saved" / "not saved" hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveNotice {
    /// The server confirmed the change.
    Saved,
    /// The change was rejected or never arrived; the message is for a toast.
    Failed(String),
}

/// Editor for the advances of one entry.
#[derive(Debug)]
pub struct AdvanceEditor<S> {
    sync: S,
    payroll_id: PayrollId,
    entry_id: PayrollEntryId,
    confirmed: EntryAdvancesView,
    loose_input: String,
    notice: Option<AutosaveNotice>,
}

impl<S: AdvanceSync> AdvanceEditor<S> {
    /// Loads the entry's advances.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; nothing is shown in that case.
    pub async fn load(
        sync: S,
        payroll_id: PayrollId,
        entry_id: PayrollEntryId,
    ) -> Result<Self, ClientError> {
        let confirmed = sync
            .fetch(payroll_id, entry_id)
            .await
            .inspect_err(|e| warn!(error = %e, entry_id = %entry_id, "Loading advances failed"))?;
        Ok(Self {
            loose_input: format_input(confirmed.selection.loose_amount),
            sync,
            payroll_id,
            entry_id,
            confirmed,
            notice: None,
        })
    }

    /// State last confirmed by the server.
    pub const fn confirmed(&self) -> &EntryAdvancesView {
        &self.confirmed
    }

    /// Text currently in the avulso box.
    pub fn loose_input(&self) -> &str {
        &self.loose_input
    }

    /// Result of the last save, if any.
    pub const fn autosave_notice(&self) -> Option<&AutosaveNotice> {
        self.notice.as_ref()
    }

    /// True when the avulso box holds a value not yet saved.
    pub fn has_pending_loose(&self) -> bool {
        parse_amount(&self.loose_input)
            .is_none_or(|value| value != self.confirmed.selection.loose_amount)
    }

    /// Links or unlinks an installment and saves the resulting selection.
    ///
    /// # Errors
    ///
    /// Returns the round-trip error; the confirmed state is unchanged.
    pub async fn toggle_installment(&mut self, id: InstallmentId) -> Result<(), ClientError> {
        let next = self.confirmed.selection.with_toggled(id);
        self.push(next).await
    }

    /// Updates the avulso box without saving.
    pub fn set_loose_input(&mut self, text: impl Into<String>) {
        self.loose_input = text.into();
    }

    /// Saves the avulso box (apply button, blur or enter).
    ///
    /// Returns `false` when there was nothing to save.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the box does not hold an amount, or the
    /// round-trip error. The typed text is kept either way.
    pub async fn commit_loose(&mut self) -> Result<bool, ClientError> {
        let Some(value) = parse_amount(&self.loose_input).filter(|v| *v >= Decimal::ZERO) else {
            let err = ClientError::InvalidInput {
                field: "looseAmount",
                value: self.loose_input.clone(),
            };
            self.notice = Some(AutosaveNotice::Failed(err.to_string()));
            return Err(err);
        };
        if value == self.confirmed.selection.loose_amount {
            return Ok(false);
        }

        let next = self.confirmed.selection.with_loose_amount(value);
        self.push(next).await?;
        Ok(true)
    }

    /// Deduction to display now: the confirmed installments plus whatever
    /// the avulso box holds, before it is saved.
    pub fn displayed_total(&self) -> Decimal {
        let linked = self
            .confirmed
            .selection
            .linked_total(&self.confirmed.available);
        let loose = parse_amount(&self.loose_input)
            .filter(|v| *v >= Decimal::ZERO)
            .unwrap_or(self.confirmed.selection.loose_amount);
        round_cents(linked + loose)
    }

    /// [`Self::displayed_total`] as shown on screen, e.g. `R$ 1.234,56`.
    pub fn displayed_total_label(&self) -> String {
        format_brl(self.displayed_total())
    }

    /// True when the installment is part of the confirmed selection.
    pub fn is_linked(&self, id: InstallmentId) -> bool {
        self.confirmed.selection.is_linked(id)
    }

    async fn push(&mut self, next: AdvanceSelection) -> Result<(), ClientError> {
        let loose_pending = self.has_pending_loose();
        match self.sync.save(self.payroll_id, self.entry_id, &next).await {
            Ok(view) => {
                debug!(
                    entry_id = %self.entry_id,
                    deduction = %view.deduction_total,
                    "Advances saved"
                );
                if !loose_pending || parse_amount(&self.loose_input) == Some(next.loose_amount) {
                    self.loose_input = format_input(view.selection.loose_amount);
                }
                self.confirmed = view;
                self.notice = Some(AutosaveNotice::Saved);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, entry_id = %self.entry_id, "Saving advances failed");
                self.notice = Some(AutosaveNotice::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}

/// Parses an amount typed as `1.234,56`, `1.500`, `1234,56` or `1234.56`.
/// An empty box is zero.
///
/// A dot followed by groups of exactly three digits separates thousands.
/// More than two decimal places is rejected rather than rounded.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let trimmed = text.trim().trim_start_matches("R$").trim();
    if trimmed.is_empty() {
        return Some(Decimal::ZERO);
    }
    let (integer, fraction) = match trimmed.split_once(',') {
        Some((integer, fraction)) => (strip_thousands(integer)?, Some(fraction)),
        None => match strip_thousands(trimmed) {
            Some(integer) => (integer, None),
            None => match trimmed.split_once('.') {
                Some((integer, fraction)) => (integer.to_string(), Some(fraction)),
                None => return None,
            },
        },
    };
    if fraction.is_some_and(|f| f.is_empty() || f.len() > 2) {
        return None;
    }
    let normalized = match fraction {
        Some(fraction) => format!("{integer}.{fraction}"),
        None => integer,
    };
    normalized.parse::<Decimal>().ok()
}

/// Removes pt-BR thousands dots, or `None` when the dots do not group
/// digits by three.
fn strip_thousands(integer: &str) -> Option<String> {
    let mut groups = integer.split('.');
    let head = groups.next()?;
    if head.is_empty() || (head.len() > 3 && integer.contains('.')) {
        return None;
    }
    let mut digits = head.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

fn format_input(value: Decimal) -> String {
    if value.is_zero() {
        String::new()
    } else {
        format!("{:.2}", round_cents(value)).replace('.', ",")
    }
}

//! Row editing for payroll entries.
//!
//! A row is `Viewing`, `Editing` or `Saving`. Amounts shown while editing
//! come from the core calculator; the server answer replaces them on save.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use safra_core::payroll::{ContractType, PaymentMethod, PayrollAmounts, PayrollLineInput, calculate};

use crate::error::ClientError;

/// Entry as the server returns it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    /// Entry id.
    pub id: Uuid,
    /// Employee id.
    pub employee_id: Uuid,
    /// Employee name, when listed with the payroll.
    #[serde(default)]
    pub employee_name: Option<String>,
    /// Contract type.
    pub contract_type: ContractType,
    /// Monthly salary.
    pub base_salary: Decimal,
    /// Day rate.
    pub daily_rate: Decimal,
    /// Days worked.
    pub days_worked: u32,
    /// Overtime hours.
    pub overtime_hours: Decimal,
    /// Overtime rate.
    pub overtime_rate: Decimal,
    /// Cost allowance.
    pub cost_allowance: Decimal,
    /// Extras.
    pub extras: Decimal,
    /// Total advance deduction.
    pub advance_deduction: Decimal,
    /// Gross amount.
    pub gross_amount: Decimal,
    /// Net amount.
    pub net_amount: Decimal,
    /// Payment method.
    pub payment_method: PaymentMethod,
}

impl EntryView {
    fn line_input(&self) -> PayrollLineInput {
        PayrollLineInput {
            contract_type: self.contract_type,
            base_salary: self.base_salary,
            daily_rate: self.daily_rate,
            days_worked: self.days_worked,
            overtime_hours: self.overtime_hours,
            overtime_rate: self.overtime_rate,
            cost_allowance: self.cost_allowance,
            extras: self.extras,
            advance_deduction: self.advance_deduction,
        }
    }
}

/// Fields sent when an edited row is saved. The advance deduction is not
/// editable here; it follows the advances selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    /// Days worked.
    pub days_worked: u32,
    /// Overtime hours.
    pub overtime_hours: Decimal,
    /// Overtime rate.
    pub overtime_rate: Decimal,
    /// Cost allowance.
    pub cost_allowance: Decimal,
    /// Extras.
    pub extras: Decimal,
    /// Payment method.
    pub payment_method: PaymentMethod,
}

impl EntryPatch {
    fn from_draft(draft: &PayrollLineInput, payment_method: PaymentMethod) -> Self {
        Self {
            days_worked: draft.days_worked,
            overtime_hours: draft.overtime_hours,
            overtime_rate: draft.overtime_rate,
            cost_allowance: draft.cost_allowance,
            extras: draft.extras,
            payment_method,
        }
    }
}

/// Where a row is in its edit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    /// Showing stored values.
    Viewing,
    /// Holding unsaved changes.
    Editing {
        /// Values being edited.
        draft: PayrollLineInput,
        /// Payment method being edited.
        payment_method: PaymentMethod,
    },
    /// A save is in flight; controls are disabled.
    Saving {
        /// Values sent.
        draft: PayrollLineInput,
        /// Payment method sent.
        payment_method: PaymentMethod,
    },
}

impl RowState {
    /// Name used in messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Viewing => "viewing",
            Self::Editing { .. } => "editing",
            Self::Saving { .. } => "saving",
        }
    }
}

/// Editor for one entry row.
#[derive(Debug, Clone)]
pub struct EntryRowEditor {
    entry: EntryView,
    state: RowState,
    last_error: Option<String>,
}

impl EntryRowEditor {
    /// Wraps a stored entry.
    pub const fn new(entry: EntryView) -> Self {
        Self {
            entry,
            state: RowState::Viewing,
            last_error: None,
        }
    }

    /// Stored entry.
    pub const fn entry(&self) -> &EntryView {
        &self.entry
    }

    /// Current state.
    pub const fn state(&self) -> &RowState {
        &self.state
    }

    /// Message of the last failed save.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True while a save is in flight.
    pub const fn is_saving(&self) -> bool {
        matches!(self.state, RowState::Saving { .. })
    }

    /// Starts editing from the stored values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRowState` unless the row is `Viewing`.
    pub fn begin_edit(&mut self) -> Result<(), ClientError> {
        self.require_viewing("edit")?;
        self.state = RowState::Editing {
            draft: self.entry.line_input(),
            payment_method: self.entry.payment_method,
        };
        self.last_error = None;
        Ok(())
    }

    /// Applies a change to the draft.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRowState` unless the row is `Editing`.
    pub fn edit(&mut self, change: impl FnOnce(&mut PayrollLineInput)) -> Result<(), ClientError> {
        match &mut self.state {
            RowState::Editing { draft, .. } => {
                change(draft);
                Ok(())
            }
            other => Err(invalid("edit", other)),
        }
    }

    /// Changes the payment method in the draft.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRowState` unless the row is `Editing`.
    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<(), ClientError> {
        match &mut self.state {
            RowState::Editing { payment_method, .. } => {
                *payment_method = method;
                Ok(())
            }
            other => Err(invalid("edit", other)),
        }
    }

    /// Amounts to display: the draft's while editing or saving, the stored
    /// ones otherwise. `None` when the draft holds figures too large to
    /// compute.
    pub fn displayed_amounts(&self) -> Option<PayrollAmounts> {
        let amounts = match &self.state {
            RowState::Editing { draft, .. } | RowState::Saving { draft, .. } => calculate(draft),
            RowState::Viewing => calculate(&self.entry.line_input()),
        };
        amounts.ok()
    }

    /// Drops the draft.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRowState` while saving.
    pub fn cancel_edit(&mut self) -> Result<(), ClientError> {
        if self.is_saving() {
            return Err(invalid("cancel", &self.state));
        }
        self.state = RowState::Viewing;
        Ok(())
    }

    /// Validates the draft and moves to `Saving`, returning what to send.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRowState` unless the row is `Editing` (a second submit
    /// while saving is refused), or `InvalidInput` naming the first bad field.
    pub fn begin_save(&mut self) -> Result<EntryPatch, ClientError> {
        let RowState::Editing {
            draft,
            payment_method,
        } = &self.state
        else {
            return Err(invalid("save", &self.state));
        };
        if let Err(e) = draft.validate().and_then(|()| calculate(draft).map(|_| ())) {
            let err = ClientError::InvalidInput {
                field: "entry",
                value: e.to_string(),
            };
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        let patch = EntryPatch::from_draft(draft, *payment_method);
        self.state = RowState::Saving {
            draft: draft.clone(),
            payment_method: *payment_method,
        };
        Ok(patch)
    }

    /// Applies the server answer to a save.
    ///
    /// On success the stored entry is replaced and the row returns to
    /// `Viewing`; on failure the draft is kept in `Editing`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRowState` unless the row is `Saving`.
    pub fn finish_save(
        &mut self,
        result: Result<EntryView, ClientError>,
    ) -> Result<(), ClientError> {
        let RowState::Saving {
            draft,
            payment_method,
        } = &self.state
        else {
            return Err(invalid("finish saving", &self.state));
        };

        match result {
            Ok(entry) => {
                self.entry = entry;
                self.state = RowState::Viewing;
                self.last_error = None;
            }
            Err(e) => {
                self.state = RowState::Editing {
                    draft: draft.clone(),
                    payment_method: *payment_method,
                };
                self.last_error = Some(e.to_string());
            }
        }
        Ok(())
    }

    fn require_viewing(&self, action: &'static str) -> Result<(), ClientError> {
        match self.state {
            RowState::Viewing => Ok(()),
            _ => Err(invalid(action, &self.state)),
        }
    }
}

fn invalid(action: &'static str, state: &RowState) -> ClientError {
    ClientError::InvalidRowState {
        action,
        state: state.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn diarista() -> EntryView {
        EntryView {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            employee_name: Some("Joaquim".into()),
            contract_type: ContractType::Diarista,
            base_salary: Decimal::ZERO,
            daily_rate: dec!(120),
            days_worked: 10,
            overtime_hours: Decimal::ZERO,
            overtime_rate: Decimal::ZERO,
            cost_allowance: Decimal::ZERO,
            extras: Decimal::ZERO,
            advance_deduction: dec!(200),
            gross_amount: dec!(1200),
            net_amount: dec!(1000),
            payment_method: PaymentMethod::Pix,
        }
    }

    #[test]
    fn test_edit_recomputes_with_calculator() {
        let mut row = EntryRowEditor::new(diarista());
        row.begin_edit().unwrap();
        row.edit(|d| d.days_worked = 12).unwrap();

        let amounts = row.displayed_amounts().unwrap();
        assert_eq!(amounts.gross_amount, dec!(1440));
        assert_eq!(amounts.net_amount, dec!(1240));
        assert_eq!(row.entry().gross_amount, dec!(1200));
    }

    #[test]
    fn test_second_submit_refused_while_saving() {
        let mut row = EntryRowEditor::new(diarista());
        row.begin_edit().unwrap();
        let patch = row.begin_save().unwrap();
        assert_eq!(patch.days_worked, 10);
        assert!(row.is_saving());

        assert!(matches!(
            row.begin_save(),
            Err(ClientError::InvalidRowState { state: "saving", .. })
        ));
        assert!(row.edit(|d| d.extras = dec!(1)).is_err());
        assert!(row.cancel_edit().is_err());
    }

    #[test]
    fn test_successful_save_returns_to_viewing() {
        let mut row = EntryRowEditor::new(diarista());
        row.begin_edit().unwrap();
        row.edit(|d| d.extras = dec!(50)).unwrap();
        row.begin_save().unwrap();

        let mut saved = diarista();
        saved.extras = dec!(50);
        saved.gross_amount = dec!(1250);
        saved.net_amount = dec!(1050);
        row.finish_save(Ok(saved)).unwrap();

        assert_eq!(row.state(), &RowState::Viewing);
        assert_eq!(row.entry().gross_amount, dec!(1250));
        assert_eq!(row.last_error(), None);
    }

    #[test]
    fn test_failed_save_keeps_draft() {
        let mut row = EntryRowEditor::new(diarista());
        row.begin_edit().unwrap();
        row.edit(|d| d.extras = dec!(50)).unwrap();
        row.begin_save().unwrap();

        row.finish_save(Err(ClientError::Api {
            status: 409,
            code: "PAYROLL_NOT_EDITABLE".into(),
            message: "Payroll is FECHADA".into(),
        }))
        .unwrap();

        assert!(matches!(row.state(), RowState::Editing { draft, .. } if draft.extras == dec!(50)));
        assert_eq!(row.entry().extras, Decimal::ZERO);
        assert!(row.last_error().unwrap().contains("FECHADA"));
    }

    #[test]
    fn test_invalid_draft_not_submitted() {
        let mut row = EntryRowEditor::new(diarista());
        row.begin_edit().unwrap();
        row.edit(|d| d.days_worked = 20).unwrap();

        assert!(matches!(
            row.begin_save(),
            Err(ClientError::InvalidInput { .. })
        ));
        assert!(matches!(row.state(), RowState::Editing { .. }));
    }

    #[test]
    fn test_oversized_draft_shows_no_amounts() {
        let mut row = EntryRowEditor::new(diarista());
        row.begin_edit().unwrap();
        row.edit(|d| {
            d.days_worked = 16;
            d.daily_rate = dec!(999999999999.99);
        })
        .unwrap();

        assert!(row.displayed_amounts().is_none());
        assert!(matches!(
            row.begin_save(),
            Err(ClientError::InvalidInput { .. })
        ));
        assert!(row.last_error().unwrap().contains("grossAmount"));
    }

    #[test]
    fn test_actions_need_matching_state() {
        let mut row = EntryRowEditor::new(diarista());
        assert!(row.begin_save().is_err());
        assert!(row.finish_save(Ok(diarista())).is_err());
        assert!(row.set_payment_method(PaymentMethod::Dinheiro).is_err());

        row.begin_edit().unwrap();
        assert!(row.begin_edit().is_err());
        row.set_payment_method(PaymentMethod::Dinheiro).unwrap();
        assert_eq!(
            row.begin_save().unwrap().payment_method,
            PaymentMethod::Dinheiro
        );
    }

    #[test]
    fn test_entry_view_reads_server_body() {
        let body = serde_json::json!({
            "id": Uuid::nil(),
            "employeeId": Uuid::nil(),
            "contractType": "MENSALISTA",
            "baseSalary": 2000,
            "dailyRate": 0,
            "daysWorked": 15,
            "absences": 0,
            "overtimeHours": 0,
            "overtimeRate": 0,
            "costAllowance": 0,
            "extras": 0,
            "looseAdvance": 0,
            "advanceDeduction": 0,
            "grossAmount": 1000,
            "netAmount": 1000,
            "paymentStatus": "PENDENTE",
            "paymentMethod": "PIX",
            "notes": null
        });

        let entry: EntryView = serde_json::from_value(body).unwrap();
        assert_eq!(entry.contract_type, ContractType::Mensalista);
        assert_eq!(EntryRowEditor::new(entry).displayed_amounts().unwrap().net_amount, dec!(1000));
    }
}

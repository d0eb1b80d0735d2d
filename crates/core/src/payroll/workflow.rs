//! Payroll lifecycle state machine.
//!
//! Validates transitions and returns the resulting [`PayrollAction`] with its
//! audit data. Persisting the action is the caller's job.

use chrono::{DateTime, Utc};
use safra_shared::types::UserId;

use super::error::PayrollError;
use super::types::PayrollStatus;
use super::validation::{FinalizationCandidate, validate_finalization};

/// A validated payroll transition.
#[derive(Debug, Clone)]
pub enum PayrollAction {
    /// Draft finalized, waiting for payment release.
    Finalize {
        /// User who finalized.
        finalized_by: UserId,
        /// When.
        finalized_at: DateTime<Utc>,
    },
    /// Finalized payroll sent back to draft.
    Reopen {
        /// User who reopened.
        reopened_by: UserId,
    },
    /// Payment batch released to the bank.
    StartProcessing {
        /// When the batch was released.
        released_at: DateTime<Utc>,
    },
    /// Every payment settled.
    Close {
        /// When the payroll was closed.
        closed_at: DateTime<Utc>,
    },
    /// Payroll cancelled.
    Cancel {
        /// User who cancelled.
        cancelled_by: UserId,
        /// When.
        cancelled_at: DateTime<Utc>,
        /// Why.
        reason: String,
    },
}

impl PayrollAction {
    /// Returns the status resulting from this action.
    #[must_use]
    pub const fn new_status(&self) -> PayrollStatus {
        match self {
            Self::Finalize { .. } => PayrollStatus::PendenteLiberacao,
            Self::Reopen { .. } => PayrollStatus::Rascunho,
            Self::StartProcessing { .. } => PayrollStatus::EmProcessamento,
            Self::Close { .. } => PayrollStatus::Fechada,
            Self::Cancel { .. } => PayrollStatus::Cancelada,
        }
    }
}

/// Stateless payroll lifecycle rules.
pub struct PayrollWorkflow;

impl PayrollWorkflow {
    /// Fails unless entries of a payroll in `status` may be changed.
    pub fn ensure_editable(status: PayrollStatus) -> Result<(), PayrollError> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(PayrollError::NotEditable(status))
        }
    }

    /// Finalizes a draft payroll after checking every entry.
    ///
    /// Nothing is changed when any entry fails the rules.
    pub fn finalize(
        current_status: PayrollStatus,
        entries: &[FinalizationCandidate],
        finalized_by: UserId,
    ) -> Result<PayrollAction, PayrollError> {
        if current_status != PayrollStatus::Rascunho {
            return Err(PayrollError::InvalidTransition {
                from: current_status,
                to: PayrollStatus::PendenteLiberacao,
            });
        }
        validate_finalization(entries)?;
        Ok(PayrollAction::Finalize {
            finalized_by,
            finalized_at: Utc::now(),
        })
    }

    /// Sends a finalized payroll back to draft.
    pub fn reopen(
        current_status: PayrollStatus,
        reopened_by: UserId,
    ) -> Result<PayrollAction, PayrollError> {
        match current_status {
            PayrollStatus::PendenteLiberacao => Ok(PayrollAction::Reopen { reopened_by }),
            _ => Err(PayrollError::InvalidTransition {
                from: current_status,
                to: PayrollStatus::Rascunho,
            }),
        }
    }

    /// Marks the payroll as being processed by the bank.
    pub fn start_processing(current_status: PayrollStatus) -> Result<PayrollAction, PayrollError> {
        match current_status {
            PayrollStatus::PendenteLiberacao => Ok(PayrollAction::StartProcessing {
                released_at: Utc::now(),
            }),
            _ => Err(PayrollError::InvalidTransition {
                from: current_status,
                to: PayrollStatus::EmProcessamento,
            }),
        }
    }

    /// Closes a payroll whose payments all settled.
    pub fn close(current_status: PayrollStatus) -> Result<PayrollAction, PayrollError> {
        match current_status {
            PayrollStatus::EmProcessamento => Ok(PayrollAction::Close {
                closed_at: Utc::now(),
            }),
            _ => Err(PayrollError::InvalidTransition {
                from: current_status,
                to: PayrollStatus::Fechada,
            }),
        }
    }

    /// Cancels a payroll that has not been sent to the bank.
    pub fn cancel(
        current_status: PayrollStatus,
        cancelled_by: UserId,
        reason: String,
    ) -> Result<PayrollAction, PayrollError> {
        if reason.trim().is_empty() {
            return Err(PayrollError::CancelReasonRequired);
        }
        match current_status {
            PayrollStatus::Rascunho | PayrollStatus::PendenteLiberacao => {
                Ok(PayrollAction::Cancel {
                    cancelled_by,
                    cancelled_at: Utc::now(),
                    reason,
                })
            }
            _ => Err(PayrollError::InvalidTransition {
                from: current_status,
                to: PayrollStatus::Cancelada,
            }),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: PayrollStatus, to: PayrollStatus) -> bool {
        matches!(
            (from, to),
            (PayrollStatus::Rascunho, PayrollStatus::PendenteLiberacao | PayrollStatus::Cancelada)
                | (
                    PayrollStatus::PendenteLiberacao,
                    PayrollStatus::Rascunho
                        | PayrollStatus::EmProcessamento
                        | PayrollStatus::Cancelada
                )
                | (PayrollStatus::EmProcessamento, PayrollStatus::Fechada)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use safra_shared::types::PayrollEntryId;

    fn good_entry() -> FinalizationCandidate {
        FinalizationCandidate {
            entry_id: PayrollEntryId::new(),
            employee_name: "Ana".to_string(),
            days_worked: 15,
            gross_amount: dec!(1000),
            advance_deduction: dec!(100),
        }
    }

    #[test]
    fn test_finalize_from_draft() {
        let action =
            PayrollWorkflow::finalize(PayrollStatus::Rascunho, &[good_entry()], UserId::new())
                .unwrap();
        assert_eq!(action.new_status(), PayrollStatus::PendenteLiberacao);
    }

    #[test]
    fn test_finalize_outside_draft_fails() {
        let result = PayrollWorkflow::finalize(
            PayrollStatus::PendenteLiberacao,
            &[good_entry()],
            UserId::new(),
        );
        assert!(matches!(
            result,
            Err(PayrollError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_finalize_with_bad_entry_fails() {
        let mut entry = good_entry();
        entry.days_worked = 0;
        let result = PayrollWorkflow::finalize(PayrollStatus::Rascunho, &[entry], UserId::new());
        assert!(matches!(
            result,
            Err(PayrollError::FinalizationBlocked { .. })
        ));
    }

    #[test]
    fn test_reopen_only_from_pending_release() {
        assert!(PayrollWorkflow::reopen(PayrollStatus::PendenteLiberacao, UserId::new()).is_ok());
        assert!(PayrollWorkflow::reopen(PayrollStatus::EmProcessamento, UserId::new()).is_err());
    }

    #[test]
    fn test_processing_then_close() {
        let action = PayrollWorkflow::start_processing(PayrollStatus::PendenteLiberacao).unwrap();
        assert_eq!(action.new_status(), PayrollStatus::EmProcessamento);
        let action = PayrollWorkflow::close(action.new_status()).unwrap();
        assert_eq!(action.new_status(), PayrollStatus::Fechada);
    }

    #[test]
    fn test_close_requires_processing() {
        assert!(PayrollWorkflow::close(PayrollStatus::PendenteLiberacao).is_err());
    }

    #[test]
    fn test_cancel_requires_reason() {
        assert!(matches!(
            PayrollWorkflow::cancel(PayrollStatus::Rascunho, UserId::new(), "  ".to_string()),
            Err(PayrollError::CancelReasonRequired)
        ));
    }

    #[test]
    fn test_cancelled_is_absorbing() {
        let user = UserId::new();
        assert!(
            PayrollWorkflow::finalize(PayrollStatus::Cancelada, &[good_entry()], user).is_err()
        );
        assert!(PayrollWorkflow::reopen(PayrollStatus::Cancelada, user).is_err());
        assert!(PayrollWorkflow::start_processing(PayrollStatus::Cancelada).is_err());
        assert!(PayrollWorkflow::close(PayrollStatus::Cancelada).is_err());
        assert!(
            PayrollWorkflow::cancel(PayrollStatus::Cancelada, user, "again".to_string()).is_err()
        );
    }

    #[test]
    fn test_ensure_editable() {
        assert!(PayrollWorkflow::ensure_editable(PayrollStatus::Rascunho).is_ok());
        assert!(matches!(
            PayrollWorkflow::ensure_editable(PayrollStatus::PendenteLiberacao),
            Err(PayrollError::NotEditable(PayrollStatus::PendenteLiberacao))
        ));
    }
}

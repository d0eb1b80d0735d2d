//! Payroll error types.

use thiserror::Error;

use super::types::PayrollStatus;
use super::validation::FinalizationIssue;

/// Errors that can occur during payroll operations.
#[derive(Debug, Error)]
pub enum PayrollError {
    /// Attempted an invalid status transition.
    #[error("Invalid payroll status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: PayrollStatus,
        /// The attempted target status.
        to: PayrollStatus,
    },

    /// Entries can only change while the payroll is a draft.
    #[error("Payroll is {0}; entries can only be changed while RASCUNHO")]
    NotEditable(PayrollStatus),

    /// Month out of range.
    #[error("Invalid payroll period {month}/{year}")]
    InvalidPeriod {
        /// Year requested.
        year: i32,
        /// Month requested.
        month: u32,
    },

    /// A numeric input was negative.
    #[error("Field {field} must not be negative")]
    NegativeValue {
        /// Wire name of the offending field.
        field: &'static str,
    },

    /// A figure does not fit a money column.
    #[error("Field {field} is too large")]
    AmountOutOfRange {
        /// Wire name of the offending field or computed amount.
        field: &'static str,
    },

    /// More days than a quinzena has.
    #[error("daysWorked must be at most {max}, got {days}")]
    DaysOutOfRange {
        /// Days requested.
        days: u32,
        /// Longest quinzena.
        max: u32,
    },

    /// One or more entries violate the finalization rules.
    #[error("Payroll cannot be finalized, offending entries: {}", .issues.len())]
    FinalizationBlocked {
        /// Every offending entry.
        issues: Vec<FinalizationIssue>,
    },

    /// A payroll without entries cannot be finalized.
    #[error("Payroll has no entries")]
    EmptyPayroll,

    /// Cancellation requires a reason.
    #[error("Cancellation reason is required")]
    CancelReasonRequired,
}

impl PayrollError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidPeriod { .. }
            | Self::NegativeValue { .. }
            | Self::AmountOutOfRange { .. }
            | Self::DaysOutOfRange { .. }
            | Self::CancelReasonRequired => 400,
            Self::InvalidTransition { .. } | Self::NotEditable(_) => 409,
            Self::FinalizationBlocked { .. } | Self::EmptyPayroll => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotEditable(_) => "PAYROLL_NOT_EDITABLE",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::NegativeValue { .. }
            | Self::AmountOutOfRange { .. }
            | Self::DaysOutOfRange { .. } => "VALIDATION_ERROR",
            Self::FinalizationBlocked { .. } => "FINALIZATION_BLOCKED",
            Self::EmptyPayroll => "EMPTY_PAYROLL",
            Self::CancelReasonRequired => "CANCEL_REASON_REQUIRED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payroll::validation::IssueKind;
    use safra_shared::types::PayrollEntryId;

    #[test]
    fn test_invalid_transition_error() {
        let err = PayrollError::InvalidTransition {
            from: PayrollStatus::Fechada,
            to: PayrollStatus::Rascunho,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("FECHADA"));
        assert!(err.to_string().contains("RASCUNHO"));
    }

    #[test]
    fn test_finalization_blocked_message_counts_entries() {
        let err = PayrollError::FinalizationBlocked {
            issues: vec![FinalizationIssue {
                entry_id: PayrollEntryId::new(),
                employee_name: "Maria".to_string(),
                problems: vec![IssueKind::ZeroDaysWorked],
            }],
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "FINALIZATION_BLOCKED");
        assert!(err.to_string().ends_with("offending entries: 1"));
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        assert_eq!(
            PayrollError::NegativeValue { field: "extras" }.status_code(),
            400
        );
        assert_eq!(PayrollError::CancelReasonRequired.status_code(), 400);
        let too_large = PayrollError::AmountOutOfRange {
            field: "grossAmount",
        };
        assert_eq!(too_large.status_code(), 400);
        assert_eq!(too_large.error_code(), "VALIDATION_ERROR");
        assert_eq!(
            PayrollError::NotEditable(PayrollStatus::Fechada).status_code(),
            409
        );
    }
}

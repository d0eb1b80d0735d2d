//! Advance error types.

use safra_shared::types::{InstallmentId, PayrollEntryId};
use thiserror::Error;

/// Errors for advances and their reconciliation against payroll entries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdvanceError {
    /// The advance total must be positive.
    #[error("Advance amount must be greater than zero")]
    NonPositiveAmount,

    /// An advance is split into at least one installment.
    #[error("Installment count must be between 1 and {max}, got {count}")]
    InvalidInstallmentCount {
        /// Requested count.
        count: u32,
        /// Largest accepted count.
        max: u32,
    },

    /// The avulso amount cannot be negative.
    #[error("Loose advance amount cannot be negative")]
    NegativeLooseAmount,

    /// The installment does not belong to the employee of the entry.
    #[error("Installment {0} is not available for this entry")]
    UnknownInstallment(InstallmentId),

    /// The installment is already deducted from another entry.
    #[error("Installment {installment_id} is already deducted from entry {entry_id}")]
    InstallmentTaken {
        /// Installment requested.
        installment_id: InstallmentId,
        /// Entry it is linked to.
        entry_id: PayrollEntryId,
    },
}

impl AdvanceError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount
            | Self::InvalidInstallmentCount { .. }
            | Self::NegativeLooseAmount => 400,
            Self::UnknownInstallment(_) => 422,
            Self::InstallmentTaken { .. } => 409,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount | Self::NegativeLooseAmount => "VALIDATION_ERROR",
            Self::InvalidInstallmentCount { .. } => "INVALID_INSTALLMENT_COUNT",
            Self::UnknownInstallment(_) => "UNKNOWN_INSTALLMENT",
            Self::InstallmentTaken { .. } => "INSTALLMENT_TAKEN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AdvanceError::NegativeLooseAmount.status_code(), 400);
        assert_eq!(
            AdvanceError::UnknownInstallment(InstallmentId::new()).status_code(),
            422
        );
        assert_eq!(
            AdvanceError::InstallmentTaken {
                installment_id: InstallmentId::new(),
                entry_id: PayrollEntryId::new(),
            }
            .error_code(),
            "INSTALLMENT_TAKEN"
        );
    }
}

//! Payment error types.

use thiserror::Error;

use super::key::PixKeyType;
use super::status::BankStatusCode;
use crate::payroll::PayrollStatus;

/// Errors for PIX keys and payment batches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The key does not match its declared type.
    #[error("Invalid {key_type} PIX key: {reason}")]
    InvalidPixKey {
        /// Declared key type.
        key_type: PixKeyType,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The bank state does not allow releasing the batch.
    #[error("Batch in state {0} cannot be released")]
    ReleaseNotAllowed(BankStatusCode),

    /// The bank state does not allow cancelling the batch.
    #[error("Batch in state {0} cannot be cancelled")]
    CancelNotAllowed(BankStatusCode),

    /// A cancelled batch no longer takes bank state updates.
    #[error("Batch was cancelled and no longer accepts state updates")]
    BatchCancelled,

    /// Items only settle once their batch was released.
    #[error("Batch has not been released; item state {0} cannot settle a payment")]
    BatchNotReleased(BankStatusCode),

    /// Batches are only built from finalized payrolls.
    #[error("Payroll must be PENDENTE_LIBERACAO to build a batch, current: {0}")]
    PayrollNotFinalized(PayrollStatus),

    /// The payroll has no entry to be paid by PIX.
    #[error("Payroll has no PIX entries with a positive net amount")]
    NoPixEntries,

    /// An employee paid by PIX has no key registered.
    #[error("Employee {0} has no PIX key")]
    MissingPixKey(String),
}

impl PaymentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidPixKey { .. } => 400,
            Self::ReleaseNotAllowed(_)
            | Self::CancelNotAllowed(_)
            | Self::BatchCancelled
            | Self::BatchNotReleased(_)
            | Self::PayrollNotFinalized(_) => 409,
            Self::NoPixEntries | Self::MissingPixKey(_) => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPixKey { .. } => "INVALID_PIX_KEY",
            Self::ReleaseNotAllowed(_) => "RELEASE_NOT_ALLOWED",
            Self::CancelNotAllowed(_) => "CANCEL_NOT_ALLOWED",
            Self::BatchCancelled => "BATCH_CANCELLED",
            Self::BatchNotReleased(_) => "BATCH_NOT_RELEASED",
            Self::PayrollNotFinalized(_) => "PAYROLL_NOT_FINALIZED",
            Self::NoPixEntries => "NO_PIX_ENTRIES",
            Self::MissingPixKey(_) => "MISSING_PIX_KEY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_batch_errors_are_conflicts() {
        assert_eq!(PaymentError::BatchCancelled.status_code(), 409);
        assert_eq!(PaymentError::BatchCancelled.error_code(), "BATCH_CANCELLED");
        let err = PaymentError::BatchNotReleased(BankStatusCode::parse("PAGO"));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "BATCH_NOT_RELEASED");
    }
}

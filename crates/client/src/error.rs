//! Client error types.

use thiserror::Error;

/// Errors surfaced to the screens.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("{message} ({code})")]
    Api {
        /// HTTP status.
        status: u16,
        /// Error code from the body.
        code: String,
        /// Message from the body.
        message: String,
    },

    /// A typed value could not be parsed.
    #[error("Invalid value for {field}: {value}")]
    InvalidInput {
        /// Field being edited.
        field: &'static str,
        /// What was typed.
        value: String,
    },

    /// A row action is not legal in the current state.
    #[error("Cannot {action} while {state}")]
    InvalidRowState {
        /// Attempted action.
        action: &'static str,
        /// Current state name.
        state: &'static str,
    },
}

impl ClientError {
    /// True when the server rejected the request on business grounds.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::Api {
            status: 409,
            code: "PAYROLL_NOT_EDITABLE".into(),
            message: "Payroll is FECHADA".into(),
        };
        assert_eq!(err.to_string(), "Payroll is FECHADA (PAYROLL_NOT_EDITABLE)");
        assert!(err.is_rejection());
    }

    #[test]
    fn test_server_failure_is_not_rejection() {
        let err = ClientError::Api {
            status: 500,
            code: "INTERNAL_ERROR".into(),
            message: "An error occurred".into(),
        };
        assert!(!err.is_rejection());
    }
}

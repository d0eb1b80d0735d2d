//! Errors that are not tied to one domain module.
//!
//! Domain errors (`PayrollError`, `AdvanceError`, ...) carry their own codes;
//! this covers lookups, conflicts on unique data and request validation.

use thiserror::Error;

/// Generic API failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// No valid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The named record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A request field was rejected.
    #[error("{0}")]
    Validation(String),

    /// A unique value is already taken. The code names what clashed.
    #[error("{message}")]
    Conflict {
        /// Error code, e.g. `DUPLICATE_CPF`.
        code: &'static str,
        /// Text for the caller.
        message: String,
    },

    /// Storage or other failure whose text is not shown to the caller.
    #[error("An error occurred")]
    Internal,
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict { .. } => 409,
            Self::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict { code, .. } => code,
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Builds a conflict from any displayable error.
    pub fn conflict(code: &'static str, err: &impl std::fmt::Display) -> Self {
        Self::Conflict {
            code,
            message: err.to_string(),
        }
    }
}

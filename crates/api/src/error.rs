//! JSON error responses.
//!
//! Every failure leaves the API as `{ "error": CODE, "message": text }`,
//! plus `details` when there is a list of offending records.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use safra_core::advance::AdvanceError;
use safra_core::payroll::PayrollError;
use safra_core::pix::PaymentError;
use safra_db::repositories::{
    AdvanceRepositoryError, EmployeeError, PaymentRepositoryError, PayrollRepositoryError,
};
use safra_shared::AppError;

/// Builds an error response.
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into()
        })),
    )
        .into_response()
}

/// Builds an error response carrying a `details` array.
pub fn error_response_with_details(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
    details: Value,
) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
            "details": details
        })),
    )
        .into_response()
}

/// Builds the response for a generic error.
pub fn app_error_response(e: &AppError) -> Response {
    error_response(status(e.status_code()), e.error_code(), e.to_string())
}

/// Storage failures never leak their text to the caller.
pub fn internal_error() -> Response {
    app_error_response(&AppError::Internal)
}

/// Rejects a request body field.
pub fn validation_error(message: impl Into<String>) -> Response {
    app_error_response(&AppError::Validation(message.into()))
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn not_found(what: &'static str) -> Response {
    app_error_response(&AppError::NotFound(what))
}

fn conflict(code: &'static str, e: &impl std::fmt::Display) -> Response {
    app_error_response(&AppError::conflict(code, e))
}

/// Maps a payroll rule violation.
pub fn payroll_error_response(e: &PayrollError) -> Response {
    match e {
        PayrollError::FinalizationBlocked { issues } => error_response_with_details(
            status(e.status_code()),
            e.error_code(),
            e.to_string(),
            json!(issues),
        ),
        _ => error_response(status(e.status_code()), e.error_code(), e.to_string()),
    }
}

/// Maps an advance rule violation.
pub fn advance_error_response(e: &AdvanceError) -> Response {
    error_response(status(e.status_code()), e.error_code(), e.to_string())
}

/// Maps a PIX rule violation.
pub fn payment_error_response(e: &PaymentError) -> Response {
    error_response(status(e.status_code()), e.error_code(), e.to_string())
}

/// Maps employee repository errors.
pub fn employee_error_response(e: &EmployeeError) -> Response {
    match e {
        EmployeeError::NotFound(_) => not_found("Employee"),
        EmployeeError::DuplicateCpf(_) => conflict("DUPLICATE_CPF", e),
        EmployeeError::NegativeValue(_) => validation_error(e.to_string()),
        EmployeeError::Payment(inner) => payment_error_response(inner),
        EmployeeError::Database(_) => internal_error(),
    }
}

/// Maps payroll repository errors.
pub fn payroll_repository_error_response(e: &PayrollRepositoryError) -> Response {
    match e {
        PayrollRepositoryError::PayrollNotFound(_) => not_found("Payroll"),
        PayrollRepositoryError::EntryNotFound(_) => not_found("Payroll entry"),
        PayrollRepositoryError::EmployeeNotFound(_) => not_found("Employee"),
        PayrollRepositoryError::PeriodTaken(_) => conflict("PERIOD_TAKEN", e),
        PayrollRepositoryError::DuplicateEntry(_) => conflict("DUPLICATE_ENTRY", e),
        PayrollRepositoryError::BatchOpen(_) => conflict("BATCH_OPEN", e),
        PayrollRepositoryError::Payroll(inner) => payroll_error_response(inner),
        PayrollRepositoryError::Database(_) => internal_error(),
    }
}

/// Maps advance repository errors.
pub fn advance_repository_error_response(e: &AdvanceRepositoryError) -> Response {
    match e {
        AdvanceRepositoryError::AdvanceNotFound(_) => not_found("Advance"),
        AdvanceRepositoryError::EmployeeNotFound(_) => not_found("Employee"),
        AdvanceRepositoryError::Advance(inner) => advance_error_response(inner),
        AdvanceRepositoryError::Payroll(inner) => payroll_repository_error_response(inner),
        AdvanceRepositoryError::Database(_) => internal_error(),
    }
}

/// Maps payment repository errors.
pub fn payment_repository_error_response(e: &PaymentRepositoryError) -> Response {
    match e {
        PaymentRepositoryError::BatchNotFound(_) => not_found("Payment batch"),
        PaymentRepositoryError::ItemNotFound(_) => not_found("Payment item"),
        PaymentRepositoryError::BankAccountNotFound(_) => not_found("Bank account"),
        PaymentRepositoryError::PayrollNotFound(_) => not_found("Payroll"),
        PaymentRepositoryError::BatchAlreadyOpen(_) => conflict("BATCH_OPEN", e),
        PaymentRepositoryError::Payment(inner) => payment_error_response(inner),
        PaymentRepositoryError::Payroll(inner) => payroll_error_response(inner),
        PaymentRepositoryError::Database(_) => internal_error(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::body_json;
    use safra_core::payroll::{FinalizationIssue, IssueKind, PayrollStatus};
    use safra_shared::types::PayrollEntryId;
    use sea_orm::DbErr;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_finalization_blocked_lists_issues() {
        let err = PayrollError::FinalizationBlocked {
            issues: vec![FinalizationIssue {
                entry_id: PayrollEntryId::new(),
                employee_name: "Ana".to_string(),
                problems: vec![IssueKind::ZeroDaysWorked],
            }],
        };

        let response = payroll_error_response(&err);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["details"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["details"][0]["employeeName"], "Ana");
    }

    #[tokio::test]
    async fn test_database_error_is_hidden() {
        let err = PayrollRepositoryError::Database(DbErr::Custom("password=hunter2".into()));

        let response = payroll_repository_error_response(&err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("hunter2"));
    }

    #[test]
    fn test_nested_errors_keep_domain_status() {
        let err = AdvanceRepositoryError::Payroll(PayrollRepositoryError::Payroll(
            PayrollError::NotEditable(PayrollStatus::Fechada),
        ));
        assert_eq!(
            advance_repository_error_response(&err).status(),
            StatusCode::from_u16(PayrollError::NotEditable(PayrollStatus::Fechada).status_code())
                .unwrap()
        );

        let missing = PaymentRepositoryError::BatchNotFound(Uuid::new_v4());
        assert_eq!(
            payment_repository_error_response(&missing).status(),
            StatusCode::NOT_FOUND
        );
    }
}

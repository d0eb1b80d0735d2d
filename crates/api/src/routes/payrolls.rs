//! Payroll (folha) routes: periods, entries, advances per entry and the
//! finalization workflow.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use safra_core::advance::{AdvanceSelection, Installment};
use safra_core::payroll::{
    ContractType, PaymentMethod, PayrollLineInput, PayrollPeriod, PayrollStatus, Quinzena,
    calculate,
};
use safra_db::entities::{payroll_entries, payrolls};
use safra_db::repositories::{
    AdvanceRepository, AdvanceRepositoryError, CreatePayrollInput, EntryAdvances,
    EntryWithEmployee, PayrollFilter, PayrollRepository, PayrollRepositoryError,
    UpdateEntryInput,
};
use safra_shared::types::PageResponse;

use super::page_request;
use crate::error::{
    advance_repository_error_response, payroll_error_response,
    payroll_repository_error_response, validation_error,
};
use crate::{AppState, middleware::AuthUser};

/// Creates the payroll routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/arh/folhas/calculo", post(preview_entry))
        .route("/arh/folhas", get(list_payrolls).post(create_payroll))
        .route("/arh/folhas/{id}", get(get_payroll))
        .route("/arh/folhas/{id}/lancamentos", post(add_entries))
        .route(
            "/arh/folhas/{id}/lancamentos/{entry_id}",
            patch(update_entry).delete(delete_entry),
        )
        .route(
            "/arh/folhas/{id}/lancamentos/{entry_id}/adiantamentos",
            get(get_entry_advances).patch(set_entry_advances),
        )
        .route("/arh/folhas/{id}/finalizar", post(finalize_payroll))
        .route("/arh/folhas/{id}/reabrir", post(reopen_payroll))
        .route("/arh/folhas/{id}/cancelar", post(cancel_payroll))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing payrolls.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPayrollsQuery {
    /// Filter by year.
    pub year: Option<i32>,
    /// Filter by month.
    pub month: Option<u32>,
    /// Filter by status (e.g. `RASCUNHO`).
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for opening a payroll.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayrollRequest {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// 1 or 2.
    pub quinzena: u8,
    /// Free text.
    pub description: Option<String>,
}

/// Request body for adding entries; all active employees when absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntriesRequest {
    /// Single employee to add.
    pub employee_id: Option<Uuid>,
}

/// Request body for editing an entry. Absent fields are kept.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    /// Contract type.
    pub contract_type: Option<ContractType>,
    /// Monthly salary.
    pub base_salary: Option<Decimal>,
    /// Day rate.
    pub daily_rate: Option<Decimal>,
    /// Days worked.
    pub days_worked: Option<u32>,
    /// Absences.
    pub absences: Option<u32>,
    /// Overtime hours.
    pub overtime_hours: Option<Decimal>,
    /// Overtime rate.
    pub overtime_rate: Option<Decimal>,
    /// Cost allowance (ajuda de custo).
    pub cost_allowance: Option<Decimal>,
    /// Extras.
    pub extras: Option<Decimal>,
    /// Payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Notes; an empty string clears them.
    pub notes: Option<String>,
}

/// Request body for cancelling a payroll.
#[derive(Debug, Deserialize)]
pub struct CancelPayrollRequest {
    /// Why the payroll is cancelled.
    #[serde(default)]
    pub reason: String,
}

/// Payroll header as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollResponse {
    /// Payroll id.
    pub id: Uuid,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: i32,
    /// 1 or 2.
    pub quinzena: i32,
    /// Free text.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Number of entries.
    pub entry_count: i32,
    /// Sum of gross amounts.
    pub total_gross: Decimal,
    /// Sum of advance deductions.
    pub total_advances: Decimal,
    /// Sum of net amounts.
    pub total_net: Decimal,
    /// When it left the draft state.
    pub finalized_at: Option<DateTime<FixedOffset>>,
    /// When its batch was released.
    pub released_at: Option<DateTime<FixedOffset>>,
    /// When every payment settled.
    pub closed_at: Option<DateTime<FixedOffset>>,
    /// When it was cancelled.
    pub cancelled_at: Option<DateTime<FixedOffset>>,
    /// Cancellation reason.
    pub cancel_reason: Option<String>,
    /// Last change.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<payrolls::Model> for PayrollResponse {
    fn from(model: payrolls::Model) -> Self {
        Self {
            id: model.id,
            year: model.year,
            month: model.month,
            quinzena: model.quinzena,
            description: model.description,
            status: model.status,
            entry_count: model.entry_count,
            total_gross: model.total_gross,
            total_advances: model.total_advances,
            total_net: model.total_net,
            finalized_at: model.finalized_at,
            released_at: model.released_at,
            closed_at: model.closed_at,
            cancelled_at: model.cancelled_at,
            cancel_reason: model.cancel_reason,
            updated_at: model.updated_at,
        }
    }
}

/// Entry (lançamento) as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    /// Entry id.
    pub id: Uuid,
    /// Employee id.
    pub employee_id: Uuid,
    /// Employee name, when loaded with the payroll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    /// MENSALISTA or DIARISTA.
    pub contract_type: String,
    /// Monthly salary.
    pub base_salary: Decimal,
    /// Day rate.
    pub daily_rate: Decimal,
    /// Days worked.
    pub days_worked: i32,
    /// Absences.
    pub absences: i32,
    /// Overtime hours.
    pub overtime_hours: Decimal,
    /// Overtime rate.
    pub overtime_rate: Decimal,
    /// Cost allowance.
    pub cost_allowance: Decimal,
    /// Extras.
    pub extras: Decimal,
    /// Avulso part of the advance deduction.
    pub loose_advance: Decimal,
    /// Total advance deduction.
    pub advance_deduction: Decimal,
    /// Gross amount.
    pub gross_amount: Decimal,
    /// Net amount.
    pub net_amount: Decimal,
    /// Payment status.
    pub payment_status: String,
    /// Payment method.
    pub payment_method: String,
    /// Notes.
    pub notes: Option<String>,
}

impl EntryResponse {
    fn new(model: payroll_entries::Model, employee_name: Option<String>) -> Self {
        Self {
            id: model.id,
            employee_id: model.employee_id,
            employee_name,
            contract_type: model.contract_type,
            base_salary: model.base_salary,
            daily_rate: model.daily_rate,
            days_worked: model.days_worked,
            absences: model.absences,
            overtime_hours: model.overtime_hours,
            overtime_rate: model.overtime_rate,
            cost_allowance: model.cost_allowance,
            extras: model.extras,
            loose_advance: model.loose_advance,
            advance_deduction: model.advance_deduction,
            gross_amount: model.gross_amount,
            net_amount: model.net_amount,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            notes: model.notes,
        }
    }
}

impl From<EntryWithEmployee> for EntryResponse {
    fn from(value: EntryWithEmployee) -> Self {
        Self::new(value.entry, Some(value.employee_name))
    }
}

/// Advances state of one entry as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAdvancesResponse {
    /// Entry id.
    pub entry_id: Uuid,
    /// Linked installments plus avulso.
    pub selection: AdvanceSelection,
    /// Installments the entry may link.
    pub available: Vec<Installment>,
    /// Sum of linked installments.
    pub linked_total: Decimal,
    /// Total deduction stored on the entry.
    pub deduction_total: Decimal,
    /// Recomputed entry, after a change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryResponse>,
}

impl EntryAdvancesResponse {
    fn new(view: EntryAdvances, entry: Option<payroll_entries::Model>) -> Self {
        Self {
            entry_id: view.entry_id,
            selection: view.selection,
            available: view.available,
            linked_total: view.linked_total,
            deduction_total: view.deduction_total,
            entry: entry.map(|e| EntryResponse::new(e, None)),
        }
    }
}

fn payroll_repo(state: &AppState) -> PayrollRepository {
    PayrollRepository::new((*state.db).clone(), state.payroll.default_monthly_days)
}

fn log_payroll_failure(e: &PayrollRepositoryError, payroll_id: Uuid, action: &str) {
    if matches!(e, PayrollRepositoryError::Database(_)) {
        error!(error = %e, payroll_id = %payroll_id, action, "Payroll operation failed");
    } else {
        warn!(error = %e, payroll_id = %payroll_id, action, "Payroll operation rejected");
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/arh/folhas/calculo` - Compute an entry without storing it.
async fn preview_entry(_auth: AuthUser, Json(input): Json<PayrollLineInput>) -> impl IntoResponse {
    match input.validate().and_then(|()| calculate(&input)) {
        Ok(amounts) => (StatusCode::OK, Json(amounts)).into_response(),
        Err(e) => payroll_error_response(&e),
    }
}

/// GET `/arh/folhas` - List payrolls.
async fn list_payrolls(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListPayrollsQuery>,
) -> impl IntoResponse {
    let status = match query.status.as_deref().map(PayrollStatus::parse) {
        None => None,
        Some(Some(status)) => Some(status),
        Some(None) => return validation_error("Unknown payroll status"),
    };
    let page = page_request(query.page, query.per_page);
    let filter = PayrollFilter {
        year: query.year,
        month: query.month,
        status,
    };

    match payroll_repo(&state).list(filter, &page).await {
        Ok((rows, total)) => {
            let data: Vec<PayrollResponse> = rows.into_iter().map(Into::into).collect();
            (
                StatusCode::OK,
                Json(PageResponse::new(data, &page, total)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list payrolls");
            payroll_repository_error_response(&e)
        }
    }
}

/// POST `/arh/folhas` - Open a draft payroll for a quinzena.
async fn create_payroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePayrollRequest>,
) -> impl IntoResponse {
    let Some(quinzena) = Quinzena::from_number(payload.quinzena) else {
        return validation_error("quinzena must be 1 or 2");
    };
    let period = match PayrollPeriod::new(payload.year, payload.month, quinzena) {
        Ok(period) => period,
        Err(e) => return payroll_error_response(&e),
    };

    let input = CreatePayrollInput {
        period,
        description: payload.description,
        created_by: auth.user_id(),
    };

    match payroll_repo(&state).create(input).await {
        Ok(payroll) => {
            info!(payroll_id = %payroll.id, period = %period.label(), "Payroll created");
            (StatusCode::CREATED, Json(PayrollResponse::from(payroll))).into_response()
        }
        Err(e) => {
            if matches!(e, PayrollRepositoryError::Database(_)) {
                error!(error = %e, "Failed to create payroll");
            }
            payroll_repository_error_response(&e)
        }
    }
}

/// GET `/arh/folhas/{id}` - Payroll with its entries.
async fn get_payroll(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match payroll_repo(&state).find_with_entries(id).await {
        Ok(found) => {
            let entries: Vec<EntryResponse> = found.entries.into_iter().map(Into::into).collect();
            (
                StatusCode::OK,
                Json(json!({
                    "payroll": PayrollResponse::from(found.payroll),
                    "entries": entries
                })),
            )
                .into_response()
        }
        Err(e) => payroll_repository_error_response(&e),
    }
}

/// POST `/arh/folhas/{id}/lancamentos` - Add one or all active employees.
async fn add_entries(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<AddEntriesRequest>>,
) -> impl IntoResponse {
    let employee_id = payload.and_then(|Json(p)| p.employee_id);

    match payroll_repo(&state).add_entries(id, employee_id).await {
        Ok(entries) => {
            info!(payroll_id = %id, added = entries.len(), "Entries added");
            let data: Vec<EntryResponse> = entries
                .into_iter()
                .map(|e| EntryResponse::new(e, None))
                .collect();
            (StatusCode::CREATED, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => {
            log_payroll_failure(&e, id, "add_entries");
            payroll_repository_error_response(&e)
        }
    }
}

/// PATCH `/arh/folhas/{id}/lancamentos/{entry_id}` - Edit and recompute an entry.
async fn update_entry(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateEntryRequest>,
) -> impl IntoResponse {
    let input = UpdateEntryInput {
        contract_type: payload.contract_type,
        base_salary: payload.base_salary,
        daily_rate: payload.daily_rate,
        days_worked: payload.days_worked,
        absences: payload.absences,
        overtime_hours: payload.overtime_hours,
        overtime_rate: payload.overtime_rate,
        cost_allowance: payload.cost_allowance,
        extras: payload.extras,
        payment_method: payload.payment_method,
        notes: payload
            .notes
            .map(|n| Some(n).filter(|n| !n.trim().is_empty())),
    };

    match payroll_repo(&state).update_entry(id, entry_id, input).await {
        Ok(entry) => {
            info!(
                payroll_id = %id,
                entry_id = %entry_id,
                gross = %entry.gross_amount,
                net = %entry.net_amount,
                "Entry updated"
            );
            (StatusCode::OK, Json(EntryResponse::new(entry, None))).into_response()
        }
        Err(e) => {
            log_payroll_failure(&e, id, "update_entry");
            payroll_repository_error_response(&e)
        }
    }
}

/// DELETE `/arh/folhas/{id}/lancamentos/{entry_id}` - Remove an entry.
async fn delete_entry(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    match payroll_repo(&state).delete_entry(id, entry_id).await {
        Ok(payroll) => {
            info!(payroll_id = %id, entry_id = %entry_id, "Entry removed");
            (StatusCode::OK, Json(PayrollResponse::from(payroll))).into_response()
        }
        Err(e) => {
            log_payroll_failure(&e, id, "delete_entry");
            payroll_repository_error_response(&e)
        }
    }
}

/// GET `/arh/folhas/{id}/lancamentos/{entry_id}/adiantamentos` - Advances of an entry.
async fn get_entry_advances(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = AdvanceRepository::new((*state.db).clone());

    match repo.entry_advances(id, entry_id).await {
        Ok(view) => {
            (StatusCode::OK, Json(EntryAdvancesResponse::new(view, None))).into_response()
        }
        Err(e) => advance_repository_error_response(&e),
    }
}

/// PATCH `/arh/folhas/{id}/lancamentos/{entry_id}/adiantamentos` - Replace the
/// linked installments and avulso of an entry.
async fn set_entry_advances(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
    Json(selection): Json<AdvanceSelection>,
) -> impl IntoResponse {
    let repo = AdvanceRepository::new((*state.db).clone());
    let linked = selection.installment_ids.len();

    match repo.set_entry_advances(id, entry_id, selection).await {
        Ok((entry, view)) => {
            info!(
                payroll_id = %id,
                entry_id = %entry_id,
                linked,
                deduction = %view.deduction_total,
                "Entry advances updated"
            );
            (
                StatusCode::OK,
                Json(EntryAdvancesResponse::new(view, Some(entry))),
            )
                .into_response()
        }
        Err(e) => {
            if matches!(e, AdvanceRepositoryError::Database(_)) {
                error!(error = %e, entry_id = %entry_id, "Failed to update entry advances");
            } else {
                warn!(error = %e, entry_id = %entry_id, "Entry advances rejected");
            }
            advance_repository_error_response(&e)
        }
    }
}

/// POST `/arh/folhas/{id}/finalizar` - Move a draft to PENDENTE_LIBERACAO.
async fn finalize_payroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match payroll_repo(&state).finalize(id, auth.user_id()).await {
        Ok(payroll) => {
            info!(
                payroll_id = %id,
                user_id = %auth.user_id(),
                role = auth.role(),
                total_net = %payroll.total_net,
                "Payroll finalized"
            );
            (StatusCode::OK, Json(PayrollResponse::from(payroll))).into_response()
        }
        Err(e) => {
            log_payroll_failure(&e, id, "finalize");
            payroll_repository_error_response(&e)
        }
    }
}

/// POST `/arh/folhas/{id}/reabrir` - Send a finalized payroll back to draft.
async fn reopen_payroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match payroll_repo(&state).reopen(id, auth.user_id()).await {
        Ok(payroll) => {
            info!(payroll_id = %id, user_id = %auth.user_id(), "Payroll reopened");
            (StatusCode::OK, Json(PayrollResponse::from(payroll))).into_response()
        }
        Err(e) => {
            log_payroll_failure(&e, id, "reopen");
            payroll_repository_error_response(&e)
        }
    }
}

/// POST `/arh/folhas/{id}/cancelar` - Cancel a payroll that was not released.
async fn cancel_payroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelPayrollRequest>,
) -> impl IntoResponse {
    match payroll_repo(&state)
        .cancel(id, auth.user_id(), payload.reason)
        .await
    {
        Ok(payroll) => {
            info!(payroll_id = %id, user_id = %auth.user_id(), "Payroll cancelled");
            (StatusCode::OK, Json(PayrollResponse::from(payroll))).into_response()
        }
        Err(e) => {
            log_payroll_failure(&e, id, "cancel");
            payroll_repository_error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header::AUTHORIZATION},
    };
    use tower::ServiceExt;

    use crate::create_router;
    use crate::test_support::{bearer, body_json, state};

    async fn post_preview(body: &str) -> axum::response::Response {
        let state = state();
        let auth = bearer(&state);
        create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/arh/folhas/calculo")
                    .header(AUTHORIZATION, auth)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_preview_monthly_half_salary() {
        let response = post_preview(
            r#"{"contractType":"MENSALISTA","baseSalary":2000,"daysWorked":15}"#,
        )
        .await;

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["grossAmount"].as_f64(), Some(1000.0));
        assert_eq!(body["netAmount"].as_f64(), Some(1000.0));
    }

    #[tokio::test]
    async fn test_preview_floors_net_at_zero() {
        let response = post_preview(
            r#"{"contractType":"DIARISTA","dailyRate":100,"daysWorked":3,"advanceDeduction":500}"#,
        )
        .await;

        let body = body_json(response).await;
        assert_eq!(body["grossAmount"].as_f64(), Some(300.0));
        assert_eq!(body["netAmount"].as_f64(), Some(0.0));
    }

    #[tokio::test]
    async fn test_preview_rejects_negative_field() {
        let response = post_preview(r#"{"contractType":"DIARISTA","extras":-1}"#).await;

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_preview_rejects_oversized_figures() {
        let response = post_preview(
            r#"{"contractType":"DIARISTA","overtimeHours":1000000000000000,"overtimeRate":1000000000000000}"#,
        )
        .await;

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("overtimeHours"));
    }

    #[tokio::test]
    async fn test_preview_rejects_gross_that_cannot_be_stored() {
        let response = post_preview(
            r#"{"contractType":"DIARISTA","dailyRate":999999999999.99,"daysWorked":16}"#,
        )
        .await;

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["message"]
            .as_str()
            .unwrap()
            .contains("grossAmount"));
    }
}

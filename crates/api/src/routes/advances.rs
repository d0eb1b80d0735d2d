//! Advance (adiantamento) routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use safra_db::entities::installments;
use safra_db::repositories::{
    AdvanceRepository, AdvanceRepositoryError, AdvanceWithInstallments, CreateAdvanceInput,
};

use crate::error::advance_repository_error_response;
use crate::{AppState, middleware::AuthUser};

/// Creates the advance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/arh/adiantamentos", get(list_advances).post(create_advance))
        .route("/arh/adiantamentos/{id}", get(get_advance))
}

/// Query parameters for listing advances.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAdvancesQuery {
    /// Only this employee's advances.
    pub employee_id: Option<Uuid>,
    /// Only advances with an outstanding balance.
    #[serde(default)]
    pub open: bool,
}

/// Request body for granting an advance.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdvanceRequest {
    /// Employee receiving the advance.
    pub employee_id: Uuid,
    /// Amount paid out.
    pub total_amount: Decimal,
    /// Number of installments; one when absent.
    #[serde(default = "default_installments")]
    pub installments: u32,
    /// Payment date; today when absent.
    pub granted_on: Option<NaiveDate>,
    /// Free text.
    pub description: Option<String>,
}

fn default_installments() -> u32 {
    1
}

/// Installment as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentResponse {
    /// Installment id.
    pub id: Uuid,
    /// Position within the advance (1-based).
    pub number: i32,
    /// Value deducted.
    pub amount: Decimal,
    /// Entry deducting it, if any.
    pub entry_id: Option<Uuid>,
}

impl From<installments::Model> for InstallmentResponse {
    fn from(model: installments::Model) -> Self {
        Self {
            id: model.id,
            number: model.number,
            amount: model.amount,
            entry_id: model.entry_id,
        }
    }
}

/// Advance as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    /// Advance id.
    pub id: Uuid,
    /// Employee id.
    pub employee_id: Uuid,
    /// Amount paid out.
    pub total_amount: Decimal,
    /// Amount not yet deducted.
    pub debt_balance: Decimal,
    /// Payment date.
    pub granted_on: NaiveDate,
    /// Free text.
    pub description: Option<String>,
    /// Installments by number.
    pub installments: Vec<InstallmentResponse>,
}

impl From<AdvanceWithInstallments> for AdvanceResponse {
    fn from(value: AdvanceWithInstallments) -> Self {
        Self {
            id: value.advance.id,
            employee_id: value.advance.employee_id,
            total_amount: value.advance.total_amount,
            debt_balance: value.debt_balance,
            granted_on: value.advance.granted_on,
            description: value.advance.description,
            installments: value.installments.into_iter().map(Into::into).collect(),
        }
    }
}

/// GET `/arh/adiantamentos` - List advances.
async fn list_advances(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListAdvancesQuery>,
) -> impl IntoResponse {
    let repo = AdvanceRepository::new((*state.db).clone());

    match repo.list(query.employee_id, query.open).await {
        Ok(advances) => {
            let data: Vec<AdvanceResponse> = advances.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list advances");
            advance_repository_error_response(&e)
        }
    }
}

/// POST `/arh/adiantamentos` - Grant an advance.
async fn create_advance(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAdvanceRequest>,
) -> impl IntoResponse {
    let repo = AdvanceRepository::new((*state.db).clone());
    let input = CreateAdvanceInput {
        employee_id: payload.employee_id,
        total_amount: payload.total_amount,
        installment_count: payload.installments,
        granted_on: payload
            .granted_on
            .unwrap_or_else(|| Utc::now().date_naive()),
        description: payload.description,
        created_by: auth.user_id(),
    };

    match repo.create(input).await {
        Ok(advance) => {
            info!(
                advance_id = %advance.advance.id,
                employee_id = %advance.advance.employee_id,
                installments = advance.installments.len(),
                "Advance granted"
            );
            (StatusCode::CREATED, Json(AdvanceResponse::from(advance))).into_response()
        }
        Err(e) => {
            if matches!(e, AdvanceRepositoryError::Database(_)) {
                error!(error = %e, "Failed to grant advance");
            }
            advance_repository_error_response(&e)
        }
    }
}

/// GET `/arh/adiantamentos/{id}` - Get one advance.
async fn get_advance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = AdvanceRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(advance) => (StatusCode::OK, Json(AdvanceResponse::from(advance))).into_response(),
        Err(e) => advance_repository_error_response(&e),
    }
}

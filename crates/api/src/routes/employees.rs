//! Employee (funcionário) routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use safra_core::payroll::ContractType;
use safra_core::pix::PixKeyType;
use safra_db::entities::employees;
use safra_db::repositories::{
    CreateEmployeeInput, EmployeeError, EmployeeFilter, EmployeeRepository, UpdateEmployeeInput,
};
use safra_shared::types::PageResponse;

use super::page_request;
use crate::error::{employee_error_response, validation_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the employee routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/arh/funcionarios", get(list_employees).post(create_employee))
        .route(
            "/arh/funcionarios/{id}",
            get(get_employee)
                .patch(update_employee)
                .delete(deactivate_employee),
        )
}

/// Query parameters for listing employees.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEmployeesQuery {
    /// Filter by active flag.
    pub active: Option<bool>,
    /// Name substring.
    pub search: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for registering an employee.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    /// Full name.
    pub name: String,
    /// CPF, with or without punctuation.
    pub cpf: Option<String>,
    /// Contract type; defaults to MENSALISTA.
    #[serde(default)]
    pub contract_type: ContractType,
    /// Monthly salary.
    #[serde(default)]
    pub base_salary: Decimal,
    /// Day rate.
    #[serde(default)]
    pub daily_rate: Decimal,
    /// PIX key type (CPF, CNPJ, EMAIL, TELEFONE, ALEATORIA).
    pub pix_key_type: Option<String>,
    /// PIX key value.
    pub pix_key: Option<String>,
}

/// Request body for updating an employee. Absent fields are kept; an empty
/// `pixKey` removes the key.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    /// Full name.
    pub name: Option<String>,
    /// Contract type.
    pub contract_type: Option<ContractType>,
    /// Monthly salary.
    pub base_salary: Option<Decimal>,
    /// Day rate.
    pub daily_rate: Option<Decimal>,
    /// PIX key type.
    pub pix_key_type: Option<String>,
    /// PIX key value.
    pub pix_key: Option<String>,
    /// Reactivate or deactivate.
    pub is_active: Option<bool>,
}

/// Employee as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    /// Employee id.
    pub id: Uuid,
    /// Full name.
    pub name: String,
    /// Normalized CPF digits.
    pub cpf: Option<String>,
    /// MENSALISTA or DIARISTA.
    pub contract_type: String,
    /// Monthly salary.
    pub base_salary: Decimal,
    /// Day rate.
    pub daily_rate: Decimal,
    /// PIX key type.
    pub pix_key_type: Option<String>,
    /// PIX key value.
    pub pix_key: Option<String>,
    /// Whether new payrolls include the employee.
    pub is_active: bool,
    /// Last change.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<employees::Model> for EmployeeResponse {
    fn from(model: employees::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            cpf: model.cpf,
            contract_type: model.contract_type,
            base_salary: model.base_salary,
            daily_rate: model.daily_rate,
            pix_key_type: model.pix_key_type,
            pix_key: model.pix_key,
            is_active: model.is_active,
            updated_at: model.updated_at,
        }
    }
}

/// Pairs a key type with its value; both or neither must be given.
fn pix_key_pair(
    key_type: Option<&str>,
    key: Option<String>,
) -> Result<Option<(PixKeyType, String)>, axum::response::Response> {
    match (key_type, key) {
        (_, None) => Ok(None),
        (None, Some(_)) => Err(validation_error("pixKeyType is required with pixKey")),
        (Some(raw_type), Some(key)) => PixKeyType::parse(raw_type)
            .map(|key_type| Some((key_type, key)))
            .ok_or_else(|| validation_error(format!("Unknown PIX key type: {raw_type}"))),
    }
}

/// GET `/arh/funcionarios` - List employees.
async fn list_employees(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListEmployeesQuery>,
) -> impl IntoResponse {
    let repo = EmployeeRepository::new((*state.db).clone());
    let page = page_request(query.page, query.per_page);
    let filter = EmployeeFilter {
        is_active: query.active,
        search: query.search,
    };

    match repo.list(filter, &page).await {
        Ok((rows, total)) => {
            let data: Vec<EmployeeResponse> = rows.into_iter().map(Into::into).collect();
            (
                StatusCode::OK,
                Json(PageResponse::new(data, &page, total)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list employees");
            employee_error_response(&e)
        }
    }
}

/// POST `/arh/funcionarios` - Register an employee.
async fn create_employee(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateEmployeeRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() {
        return validation_error("name is required");
    }
    let pix_key = match pix_key_pair(payload.pix_key_type.as_deref(), payload.pix_key) {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    let repo = EmployeeRepository::new((*state.db).clone());
    let input = CreateEmployeeInput {
        name: payload.name,
        cpf: payload.cpf.filter(|c| !c.trim().is_empty()),
        contract_type: payload.contract_type,
        base_salary: payload.base_salary,
        daily_rate: payload.daily_rate,
        pix_key,
    };

    match repo.create(input).await {
        Ok(employee) => {
            info!(employee_id = %employee.id, "Employee registered");
            (StatusCode::CREATED, Json(EmployeeResponse::from(employee))).into_response()
        }
        Err(e) => {
            if matches!(e, EmployeeError::Database(_)) {
                error!(error = %e, "Failed to register employee");
            }
            employee_error_response(&e)
        }
    }
}

/// GET `/arh/funcionarios/{id}` - Get one employee.
async fn get_employee(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = EmployeeRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(employee) => (StatusCode::OK, Json(EmployeeResponse::from(employee))).into_response(),
        Err(e) => employee_error_response(&e),
    }
}

/// PATCH `/arh/funcionarios/{id}` - Update an employee.
async fn update_employee(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> impl IntoResponse {
    let pix_key = match payload.pix_key {
        None => None,
        Some(key) if key.trim().is_empty() => Some(None),
        Some(key) => match pix_key_pair(payload.pix_key_type.as_deref(), Some(key)) {
            Ok(pair) => Some(pair),
            Err(response) => return response,
        },
    };

    let repo = EmployeeRepository::new((*state.db).clone());
    let input = UpdateEmployeeInput {
        name: payload.name.filter(|n| !n.trim().is_empty()),
        contract_type: payload.contract_type,
        base_salary: payload.base_salary,
        daily_rate: payload.daily_rate,
        pix_key,
        is_active: payload.is_active,
    };

    match repo.update(id, input).await {
        Ok(employee) => {
            info!(employee_id = %employee.id, "Employee updated");
            (StatusCode::OK, Json(EmployeeResponse::from(employee))).into_response()
        }
        Err(e) => {
            if matches!(e, EmployeeError::Database(_)) {
                error!(error = %e, employee_id = %id, "Failed to update employee");
            }
            employee_error_response(&e)
        }
    }
}

/// DELETE `/arh/funcionarios/{id}` - Deactivate an employee.
async fn deactivate_employee(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = EmployeeRepository::new((*state.db).clone());

    match repo.deactivate(id).await {
        Ok(employee) => {
            info!(employee_id = %employee.id, "Employee deactivated");
            (StatusCode::OK, Json(EmployeeResponse::from(employee))).into_response()
        }
        Err(e) => {
            error!(error = %e, employee_id = %id, "Failed to deactivate employee");
            employee_error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pix_key_pair_requires_type() {
        assert!(pix_key_pair(None, Some("a@b.com".into())).is_err());
        assert!(pix_key_pair(Some("BITCOIN"), Some("x".into())).is_err());
        assert_eq!(pix_key_pair(Some("EMAIL"), None).unwrap(), None);
        assert_eq!(
            pix_key_pair(Some("email"), Some("a@b.com".into())).unwrap(),
            Some((PixKeyType::Email, "a@b.com".to_string()))
        );
    }
}

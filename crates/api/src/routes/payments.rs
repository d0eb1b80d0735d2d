//! PIX payment routes: bank accounts, batches (lotes), items and the status
//! legend.

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

use safra_core::pix::{
    BankStatusCode, StatusDisplay, describe_batch_status, describe_item_status, status_table,
};
use safra_db::entities::{bank_accounts, payment_batches, payment_items};
use safra_db::repositories::{
    BatchWithItems, CreateBankAccountInput, CreateBatchInput, PaymentRepository,
    PaymentRepositoryError,
};
use safra_shared::types::PageResponse;

use super::page_request;
use crate::error::{payment_repository_error_response, validation_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pagamentos/status", get(get_status_table))
        .route(
            "/pagamentos/contas-correntes",
            get(list_bank_accounts).post(create_bank_account),
        )
        .route("/pagamentos/lotes", get(list_batches).post(create_batch))
        .route("/pagamentos/lotes/{id}", get(get_batch))
        .route("/pagamentos/lotes/{id}/estado", patch(update_batch_state))
        .route("/pagamentos/lotes/{id}/liberar", post(release_batch))
        .route("/pagamentos/lotes/{id}/cancelar", post(cancel_batch))
        .route("/pagamentos/itens/{id}", get(get_item))
        .route("/pagamentos/itens/{id}/estado", patch(update_item_state))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing batches.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBatchesQuery {
    /// Only batches of this payroll.
    pub payroll_id: Option<Uuid>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for registering a company account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBankAccountRequest {
    /// Display name.
    pub name: String,
    /// Branch.
    pub agency: String,
    /// Account number.
    pub account_number: String,
    /// Payment agreement (convênio) number.
    pub agreement_number: String,
}

/// Request body for creating a batch from a finalized payroll.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    /// Payroll to pay.
    pub payroll_id: Uuid,
    /// Debited account.
    pub bank_account_id: Uuid,
    /// Bank request number; the next free one when absent.
    pub requisicao: Option<i64>,
    /// Free text.
    pub description: Option<String>,
}

/// Bank state reported for a batch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStateRequest {
    /// Numeric or text state code.
    pub estado_requisicao: BankStatusCode,
}

/// Bank state reported for an item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStateRequest {
    /// Text or numeric state code.
    pub estado_pagamento: BankStatusCode,
    /// Bank transaction reference.
    pub bank_reference: Option<String>,
}

/// Company account as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountResponse {
    /// Account id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Branch.
    pub agency: String,
    /// Account number.
    pub account_number: String,
    /// Agreement number.
    pub agreement_number: String,
    /// Whether batches may debit it.
    pub is_active: bool,
}

impl From<bank_accounts::Model> for BankAccountResponse {
    fn from(model: bank_accounts::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            agency: model.agency,
            account_number: model.account_number,
            agreement_number: model.agreement_number,
            is_active: model.is_active,
        }
    }
}

/// Batch as returned by the API, with its rendered state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    /// Batch id.
    pub id: Uuid,
    /// Payroll paid by the batch.
    pub payroll_id: Option<Uuid>,
    /// Debited account.
    pub bank_account_id: Uuid,
    /// Bank request number.
    pub requisicao: i64,
    /// Raw bank state.
    pub estado_requisicao: String,
    /// Rendered bank state and allowed actions.
    pub status: StatusDisplay,
    /// Free text.
    pub description: Option<String>,
    /// Number of transfers.
    pub item_count: i32,
    /// Amount sent.
    pub total_amount: Decimal,
    /// Amount the bank accepted.
    pub validated_amount: Decimal,
    /// When it was released.
    pub released_at: Option<DateTime<FixedOffset>>,
    /// When it was cancelled.
    pub cancelled_at: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<payment_batches::Model> for BatchResponse {
    fn from(model: payment_batches::Model) -> Self {
        let status = describe_batch_status(&BankStatusCode::parse(&model.estado_requisicao));
        Self {
            id: model.id,
            payroll_id: model.payroll_id,
            bank_account_id: model.bank_account_id,
            requisicao: model.requisicao,
            estado_requisicao: model.estado_requisicao,
            status,
            description: model.description,
            item_count: model.item_count,
            total_amount: model.total_amount,
            validated_amount: model.validated_amount,
            released_at: model.released_at,
            cancelled_at: model.cancelled_at,
            created_at: model.created_at,
        }
    }
}

/// PIX transfer as returned by the API, with its rendered state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    /// Item id.
    pub id: Uuid,
    /// Batch id.
    pub batch_id: Uuid,
    /// Payroll entry paid.
    pub entry_id: Option<Uuid>,
    /// Employee paid.
    pub employee_id: Option<Uuid>,
    /// Beneficiary name.
    pub beneficiary_name: String,
    /// PIX key type.
    pub pix_key_type: String,
    /// PIX key.
    pub pix_key: String,
    /// Amount.
    pub amount: Decimal,
    /// Raw bank state.
    pub estado_pagamento: String,
    /// Rendered bank state.
    pub status: StatusDisplay,
    /// Bank transaction reference.
    pub bank_reference: Option<String>,
}

impl From<payment_items::Model> for ItemResponse {
    fn from(model: payment_items::Model) -> Self {
        let status = describe_item_status(&BankStatusCode::parse(&model.estado_pagamento));
        Self {
            id: model.id,
            batch_id: model.batch_id,
            entry_id: model.entry_id,
            employee_id: model.employee_id,
            beneficiary_name: model.beneficiary_name,
            pix_key_type: model.pix_key_type,
            pix_key: model.pix_key,
            amount: model.amount,
            estado_pagamento: model.estado_pagamento,
            status,
            bank_reference: model.bank_reference,
        }
    }
}

fn batch_body(value: BatchWithItems) -> serde_json::Value {
    let items: Vec<ItemResponse> = value.items.into_iter().map(Into::into).collect();
    json!({
        "batch": BatchResponse::from(value.batch),
        "items": items
    })
}

fn log_payment_failure(e: &PaymentRepositoryError, action: &str) {
    if matches!(e, PaymentRepositoryError::Database(_)) {
        error!(error = %e, action, "Payment operation failed");
    } else {
        warn!(error = %e, action, "Payment operation rejected");
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/pagamentos/status` - Every known batch and item state.
async fn get_status_table(_auth: AuthUser) -> impl IntoResponse {
    (StatusCode::OK, Json(status_table()))
}

/// GET `/pagamentos/contas-correntes` - List company accounts.
async fn list_bank_accounts(State(state): State<AppState>, _auth: AuthUser) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.list_bank_accounts().await {
        Ok(accounts) => {
            let data: Vec<BankAccountResponse> = accounts.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list bank accounts");
            payment_repository_error_response(&e)
        }
    }
}

/// POST `/pagamentos/contas-correntes` - Register a company account.
async fn create_bank_account(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateBankAccountRequest>,
) -> impl IntoResponse {
    if [
        &payload.name,
        &payload.agency,
        &payload.account_number,
        &payload.agreement_number,
    ]
    .iter()
    .any(|v| v.trim().is_empty())
    {
        return validation_error("name, agency, accountNumber and agreementNumber are required");
    }

    let repo = PaymentRepository::new((*state.db).clone());
    let input = CreateBankAccountInput {
        name: payload.name,
        agency: payload.agency,
        account_number: payload.account_number,
        agreement_number: payload.agreement_number,
    };

    match repo.create_bank_account(input).await {
        Ok(account) => {
            info!(bank_account_id = %account.id, "Bank account registered");
            (StatusCode::CREATED, Json(BankAccountResponse::from(account))).into_response()
        }
        Err(e) => {
            log_payment_failure(&e, "create_bank_account");
            payment_repository_error_response(&e)
        }
    }
}

/// GET `/pagamentos/lotes` - List batches, newest first.
async fn list_batches(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListBatchesQuery>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());
    let page = page_request(query.page, query.per_page);

    match repo.list_batches(query.payroll_id, &page).await {
        Ok((rows, total)) => {
            let data: Vec<BatchResponse> = rows.into_iter().map(Into::into).collect();
            (
                StatusCode::OK,
                Json(PageResponse::new(data, &page, total)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list batches");
            payment_repository_error_response(&e)
        }
    }
}

/// POST `/pagamentos/lotes` - Build a batch from a finalized payroll's PIX entries.
async fn create_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateBatchRequest>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());
    let input = CreateBatchInput {
        payroll_id: payload.payroll_id,
        bank_account_id: payload.bank_account_id,
        requisicao: payload.requisicao,
        description: payload.description,
        created_by: auth.user_id(),
    };

    match repo.create_batch(input).await {
        Ok(created) => {
            info!(
                batch_id = %created.batch.id,
                payroll_id = %payload.payroll_id,
                requisicao = created.batch.requisicao,
                items = created.items.len(),
                total = %created.batch.total_amount,
                "Payment batch created"
            );
            (StatusCode::CREATED, Json(batch_body(created))).into_response()
        }
        Err(e) => {
            log_payment_failure(&e, "create_batch");
            payment_repository_error_response(&e)
        }
    }
}

/// GET `/pagamentos/lotes/{id}` - Batch with its items.
async fn get_batch(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.find_batch(id).await {
        Ok(found) => (StatusCode::OK, Json(batch_body(found))).into_response(),
        Err(e) => payment_repository_error_response(&e),
    }
}

/// PATCH `/pagamentos/lotes/{id}/estado` - Store the state reported by the bank.
async fn update_batch_state(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BatchStateRequest>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.update_batch_state(id, &payload.estado_requisicao).await {
        Ok(batch) => {
            info!(batch_id = %id, estado = %payload.estado_requisicao, "Batch state synced");
            (StatusCode::OK, Json(BatchResponse::from(batch))).into_response()
        }
        Err(e) => {
            log_payment_failure(&e, "update_batch_state");
            payment_repository_error_response(&e)
        }
    }
}

/// POST `/pagamentos/lotes/{id}/liberar` - Release a batch for payment.
async fn release_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.release_batch(id).await {
        Ok(batch) => {
            info!(batch_id = %id, user_id = %auth.user_id(), "Batch released");
            (StatusCode::OK, Json(BatchResponse::from(batch))).into_response()
        }
        Err(e) => {
            log_payment_failure(&e, "release_batch");
            payment_repository_error_response(&e)
        }
    }
}

/// POST `/pagamentos/lotes/{id}/cancelar` - Cancel a batch that was not paid.
async fn cancel_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.cancel_batch(id).await {
        Ok(batch) => {
            info!(batch_id = %id, user_id = %auth.user_id(), "Batch cancelled");
            (StatusCode::OK, Json(BatchResponse::from(batch))).into_response()
        }
        Err(e) => {
            log_payment_failure(&e, "cancel_batch");
            payment_repository_error_response(&e)
        }
    }
}

/// GET `/pagamentos/itens/{id}` - One PIX transfer.
async fn get_item(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.find_item(id).await {
        Ok(item) => (StatusCode::OK, Json(ItemResponse::from(item))).into_response(),
        Err(e) => payment_repository_error_response(&e),
    }
}

/// PATCH `/pagamentos/itens/{id}/estado` - Reconcile one transfer with the bank.
async fn update_item_state(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemStateRequest>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo
        .update_item_state(id, &payload.estado_pagamento, payload.bank_reference)
        .await
    {
        Ok(settlement) => {
            info!(
                item_id = %id,
                batch_id = %settlement.batch.id,
                estado = %payload.estado_pagamento,
                payroll_closed = settlement.payroll_closed,
                "Item state synced"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "item": ItemResponse::from(settlement.item),
                    "batch": BatchResponse::from(settlement.batch),
                    "batchSettlement": settlement.batch_settlement,
                    "payrollClosed": settlement.payroll_closed
                })),
            )
                .into_response()
        }
        Err(e) => {
            log_payment_failure(&e, "update_item_state");
            payment_repository_error_response(&e)
        }
    }
}

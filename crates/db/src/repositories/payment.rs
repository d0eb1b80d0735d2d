//! PIX payment repository: bank accounts, batches (lotes) and items.
//!
//! The bank itself is not called from here. Batch and item states arrive
//! through the state sync operations and drive the payroll lifecycle.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use tracing::info;
use uuid::Uuid;

use safra_core::payroll::{
    PaymentMethod, PaymentStatus, PayrollError, PayrollStatus, PayrollWorkflow,
};
use safra_core::pix::{
    BankStatusCode, PaymentError, Settlement, describe_item_status, ensure_cancel_allowed,
    ensure_release_allowed, summarize_items,
};
use safra_shared::types::PageRequest;

use crate::entities::{
    bank_accounts, employees, payment_batches, payment_items, payroll_entries, payrolls,
};

use super::employee::stored_pix_key;
use super::payroll::{CANCELLED_BATCH_STATE, apply_action, payroll_status};

/// State given to a batch when it is registered.
pub const INITIAL_BATCH_STATE: u8 = 8;
/// State written once the batch is released through the API.
pub const RELEASED_BATCH_STATE: u8 = 9;
/// State given to new items.
pub const INITIAL_ITEM_STATE: &str = "PENDENTE";

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentRepositoryError {
    /// Batch not found.
    #[error("Payment batch not found: {0}")]
    BatchNotFound(Uuid),

    /// Item not found.
    #[error("Payment item not found: {0}")]
    ItemNotFound(Uuid),

    /// Bank account not found or inactive.
    #[error("Bank account not found: {0}")]
    BankAccountNotFound(Uuid),

    /// Payroll not found.
    #[error("Payroll not found: {0}")]
    PayrollNotFound(Uuid),

    /// The payroll already has a batch that was not cancelled.
    #[error("Payroll already has open batch {0}")]
    BatchAlreadyOpen(Uuid),

    /// Payment rule violated.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Payroll rule violated.
    #[error(transparent)]
    Payroll(#[from] PayrollError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for registering a company bank account.
#[derive(Debug, Clone)]
pub struct CreateBankAccountInput {
    /// Display name.
    pub name: String,
    /// Branch.
    pub agency: String,
    /// Account number.
    pub account_number: String,
    /// Payment agreement (convênio) number.
    pub agreement_number: String,
}

/// Input for building a batch from a finalized payroll.
#[derive(Debug, Clone)]
pub struct CreateBatchInput {
    /// Payroll to pay.
    pub payroll_id: Uuid,
    /// Account debited.
    pub bank_account_id: Uuid,
    /// Request number; the next free one for the account when `None`.
    pub requisicao: Option<i64>,
    /// Free text.
    pub description: Option<String>,
    /// User creating it.
    pub created_by: Uuid,
}

/// Batch with its items.
#[derive(Debug, Clone)]
pub struct BatchWithItems {
    /// The batch.
    pub batch: payment_batches::Model,
    /// Its transfers.
    pub items: Vec<payment_items::Model>,
}

/// Result of reconciling one item.
#[derive(Debug, Clone)]
pub struct ItemSettlement {
    /// Updated item.
    pub item: payment_items::Model,
    /// Batch with refreshed amounts.
    pub batch: payment_batches::Model,
    /// Settlement of the whole batch after the change.
    pub batch_settlement: Settlement,
    /// True when this change closed the payroll.
    pub payroll_closed: bool,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists active bank accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_bank_accounts(
        &self,
    ) -> Result<Vec<bank_accounts::Model>, PaymentRepositoryError> {
        Ok(bank_accounts::Entity::find()
            .filter(bank_accounts::Column::IsActive.eq(true))
            .order_by_asc(bank_accounts::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Registers a bank account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_bank_account(
        &self,
        input: CreateBankAccountInput,
    ) -> Result<bank_accounts::Model, PaymentRepositoryError> {
        let account = bank_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            agency: Set(input.agency),
            account_number: Set(input.account_number),
            agreement_number: Set(input.agreement_number),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        };
        Ok(account.insert(&self.db).await?)
    }

    /// Builds a batch with one PIX item per entry paid by PIX with a
    /// positive net amount.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payroll is not `PENDENTE_LIBERACAO`
    /// - The payroll already has a batch that was not cancelled
    /// - There is nothing to pay by PIX, or an employee has no key
    pub async fn create_batch(
        &self,
        input: CreateBatchInput,
    ) -> Result<BatchWithItems, PaymentRepositoryError> {
        let txn = self.db.begin().await?;

        let payroll = payrolls::Entity::find_by_id(input.payroll_id)
            .one(&txn)
            .await?
            .ok_or(PaymentRepositoryError::PayrollNotFound(input.payroll_id))?;
        let status = payroll_status(&payroll)?;
        if status != PayrollStatus::PendenteLiberacao {
            return Err(PaymentError::PayrollNotFinalized(status).into());
        }

        let account = bank_accounts::Entity::find_by_id(input.bank_account_id)
            .one(&txn)
            .await?
            .filter(|a| a.is_active)
            .ok_or(PaymentRepositoryError::BankAccountNotFound(input.bank_account_id))?;

        if let Some(open) = payment_batches::Entity::find()
            .filter(payment_batches::Column::PayrollId.eq(payroll.id))
            .filter(payment_batches::Column::EstadoRequisicao.ne(CANCELLED_BATCH_STATE))
            .one(&txn)
            .await?
        {
            return Err(PaymentRepositoryError::BatchAlreadyOpen(open.id));
        }

        let entries = payroll_entries::Entity::find()
            .filter(payroll_entries::Column::PayrollId.eq(payroll.id))
            .filter(payroll_entries::Column::PaymentMethod.eq(PaymentMethod::Pix.as_str()))
            .filter(payroll_entries::Column::NetAmount.gt(Decimal::ZERO))
            .find_also_related(employees::Entity)
            .order_by_asc(employees::Column::Name)
            .all(&txn)
            .await?;
        if entries.is_empty() {
            return Err(PaymentError::NoPixEntries.into());
        }

        let requisicao = match input.requisicao {
            Some(n) => n,
            None => next_requisicao(&txn, account.id).await?,
        };
        let now = Utc::now().into();
        let batch = payment_batches::ActiveModel {
            id: Set(Uuid::now_v7()),
            payroll_id: Set(Some(payroll.id)),
            bank_account_id: Set(account.id),
            requisicao: Set(requisicao),
            estado_requisicao: Set(INITIAL_BATCH_STATE.to_string()),
            description: Set(input.description),
            item_count: Set(0),
            total_amount: Set(Decimal::ZERO),
            validated_amount: Set(Decimal::ZERO),
            released_at: Set(None),
            cancelled_at: Set(None),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(entries.len());
        for (entry, employee) in entries {
            let Some(employee) = employee else {
                return Err(DbErr::RecordNotFound(format!("employee {}", entry.employee_id)).into());
            };
            let key = stored_pix_key(&employee)
                .ok_or_else(|| PaymentError::MissingPixKey(employee.name.clone()))?;
            let item = payment_items::ActiveModel {
                id: Set(Uuid::now_v7()),
                batch_id: Set(batch.id),
                entry_id: Set(Some(entry.id)),
                employee_id: Set(Some(employee.id)),
                beneficiary_name: Set(employee.name),
                pix_key_type: Set(key.key_type.as_str().to_string()),
                pix_key: Set(key.value),
                amount: Set(entry.net_amount),
                estado_pagamento: Set(INITIAL_ITEM_STATE.to_string()),
                bank_reference: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        let batch = refresh_batch(&txn, batch).await?;
        txn.commit().await?;

        Ok(BatchWithItems { batch, items })
    }

    /// Lists batches, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_batches(
        &self,
        payroll_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<(Vec<payment_batches::Model>, u64), PaymentRepositoryError> {
        let mut query =
            payment_batches::Entity::find().order_by_desc(payment_batches::Column::CreatedAt);
        if let Some(payroll_id) = payroll_id {
            query = query.filter(payment_batches::Column::PayrollId.eq(payroll_id));
        }
        let total = query.clone().count(&self.db).await?;
        let rows = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok((rows, total))
    }

    /// Loads a batch with its items.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound` if it does not exist.
    pub async fn find_batch(&self, id: Uuid) -> Result<BatchWithItems, PaymentRepositoryError> {
        let batch = find_batch(&self.db, id).await?;
        let items = batch_items(&self.db, id).await?;
        Ok(BatchWithItems { batch, items })
    }

    /// Stores the state the bank reports for a batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound` if it does not exist and `BatchCancelled` once
    /// it was cancelled.
    pub async fn update_batch_state(
        &self,
        id: Uuid,
        estado: &BankStatusCode,
    ) -> Result<payment_batches::Model, PaymentRepositoryError> {
        let batch = find_batch(&self.db, id).await?;
        ensure_not_cancelled(&batch)?;
        let mut active: payment_batches::ActiveModel = batch.into();
        active.estado_requisicao = Set(estado.as_string());
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Releases a batch for payment and moves the payroll to processing.
    ///
    /// # Errors
    ///
    /// Returns `ReleaseNotAllowed` unless the batch state is 1 or 4.
    pub async fn release_batch(
        &self,
        id: Uuid,
    ) -> Result<payment_batches::Model, PaymentRepositoryError> {
        let txn = self.db.begin().await?;

        let batch = find_batch(&txn, id).await?;
        ensure_release_allowed(&BankStatusCode::parse(&batch.estado_requisicao))?;

        if let Some(payroll_id) = batch.payroll_id {
            let payroll = payrolls::Entity::find_by_id(payroll_id)
                .one(&txn)
                .await?
                .ok_or(PaymentRepositoryError::PayrollNotFound(payroll_id))?;
            let action = PayrollWorkflow::start_processing(payroll_status(&payroll)?)?;
            apply_action(&txn, payroll, &action).await?;
        }

        let entry_ids: Vec<Uuid> = batch_items(&txn, id)
            .await?
            .into_iter()
            .filter_map(|item| item.entry_id)
            .collect();
        set_entries_status(&txn, &entry_ids, PaymentStatus::Processando).await?;

        let now = Utc::now().into();
        let mut active: payment_batches::ActiveModel = batch.into();
        active.estado_requisicao = Set(RELEASED_BATCH_STATE.to_string());
        active.released_at = Set(Some(now));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Cancels a batch that the bank has not started paying.
    ///
    /// The payroll stays `PENDENTE_LIBERACAO` so it can be reopened or paid
    /// by a new batch.
    ///
    /// # Errors
    ///
    /// Returns `CancelNotAllowed` if the batch state does not permit it.
    pub async fn cancel_batch(
        &self,
        id: Uuid,
    ) -> Result<payment_batches::Model, PaymentRepositoryError> {
        let txn = self.db.begin().await?;

        let batch = find_batch(&txn, id).await?;
        ensure_cancel_allowed(&BankStatusCode::parse(&batch.estado_requisicao))?;

        let now = chrono::DateTime::<chrono::FixedOffset>::from(Utc::now());
        payment_items::Entity::update_many()
            .col_expr(
                payment_items::Column::EstadoPagamento,
                Expr::value(CANCELLED_BATCH_STATE),
            )
            .col_expr(payment_items::Column::UpdatedAt, Expr::value(now))
            .filter(payment_items::Column::BatchId.eq(id))
            .exec(&txn)
            .await?;

        let mut active: payment_batches::ActiveModel = batch.into();
        active.estado_requisicao = Set(CANCELLED_BATCH_STATE.to_string());
        active.cancelled_at = Set(Some(now));
        active.validated_amount = Set(Decimal::ZERO);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Finds a payment item.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if it does not exist.
    pub async fn find_item(
        &self,
        id: Uuid,
    ) -> Result<payment_items::Model, PaymentRepositoryError> {
        payment_items::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentRepositoryError::ItemNotFound(id))
    }

    /// Stores the state the bank reports for one transfer.
    ///
    /// Settles the linked entry, refreshes the batch amounts and closes the
    /// payroll once every item of the batch is terminal.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the item does not exist, `BatchCancelled`
    /// for items of a cancelled batch and `BatchNotReleased` when a paid or
    /// failed state arrives before the batch was released.
    pub async fn update_item_state(
        &self,
        id: Uuid,
        estado: &BankStatusCode,
        bank_reference: Option<String>,
    ) -> Result<ItemSettlement, PaymentRepositoryError> {
        let txn = self.db.begin().await?;

        let item = payment_items::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(PaymentRepositoryError::ItemNotFound(id))?;
        let batch = find_batch(&txn, item.batch_id).await?;
        ensure_item_state_allowed(&batch, estado)?;

        let mut active: payment_items::ActiveModel = item.into();
        active.estado_pagamento = Set(estado.as_string());
        if bank_reference.is_some() {
            active.bank_reference = Set(bank_reference);
        }
        active.updated_at = Set(Utc::now().into());
        let item = active.update(&txn).await?;

        if let Some(entry_id) = item.entry_id {
            let status = match describe_item_status(estado).outcome {
                Settlement::Paid => Some(PaymentStatus::Pago),
                Settlement::Failed => Some(PaymentStatus::Falhou),
                Settlement::Pending => None,
            };
            if let Some(status) = status {
                set_entries_status(&txn, &[entry_id], status).await?;
            }
        }

        let batch = refresh_batch(&txn, batch).await?;
        let codes: Vec<BankStatusCode> = batch_items(&txn, batch.id)
            .await?
            .iter()
            .map(|i| BankStatusCode::parse(&i.estado_pagamento))
            .collect();
        let batch_settlement = safra_core::pix::batch_settlement(&codes);

        let mut payroll_closed = false;
        if batch_settlement.is_terminal()
            && let Some(payroll_id) = batch.payroll_id
        {
            let payroll = payrolls::Entity::find_by_id(payroll_id)
                .one(&txn)
                .await?
                .ok_or(PaymentRepositoryError::PayrollNotFound(payroll_id))?;
            if payroll_status(&payroll)? == PayrollStatus::EmProcessamento {
                let action = PayrollWorkflow::close(PayrollStatus::EmProcessamento)?;
                apply_action(&txn, payroll, &action).await?;
                payroll_closed = true;
                info!(payroll_id = %payroll_id, batch_id = %batch.id, "Payroll closed");
            }
        }

        txn.commit().await?;
        Ok(ItemSettlement {
            item,
            batch,
            batch_settlement,
            payroll_closed,
        })
    }
}

async fn find_batch<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<payment_batches::Model, PaymentRepositoryError> {
    payment_batches::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(PaymentRepositoryError::BatchNotFound(id))
}

fn is_cancelled(batch: &payment_batches::Model) -> bool {
    batch.cancelled_at.is_some() || batch.estado_requisicao == CANCELLED_BATCH_STATE
}

fn ensure_not_cancelled(batch: &payment_batches::Model) -> Result<(), PaymentError> {
    if is_cancelled(batch) {
        return Err(PaymentError::BatchCancelled);
    }
    Ok(())
}

/// Items of a live batch may record any state, but only a released batch
/// settles payments.
fn ensure_item_state_allowed(
    batch: &payment_batches::Model,
    estado: &BankStatusCode,
) -> Result<(), PaymentError> {
    ensure_not_cancelled(batch)?;
    if batch.released_at.is_none() && describe_item_status(estado).outcome != Settlement::Pending {
        return Err(PaymentError::BatchNotReleased(estado.clone()));
    }
    Ok(())
}

async fn batch_items<C: ConnectionTrait>(
    conn: &C,
    batch_id: Uuid,
) -> Result<Vec<payment_items::Model>, DbErr> {
    payment_items::Entity::find()
        .filter(payment_items::Column::BatchId.eq(batch_id))
        .order_by_asc(payment_items::Column::BeneficiaryName)
        .all(conn)
        .await
}

async fn next_requisicao<C: ConnectionTrait>(
    conn: &C,
    bank_account_id: Uuid,
) -> Result<i64, DbErr> {
    let last = payment_batches::Entity::find()
        .filter(payment_batches::Column::BankAccountId.eq(bank_account_id))
        .order_by_desc(payment_batches::Column::Requisicao)
        .one(conn)
        .await?;
    Ok(last.map_or(1, |b| b.requisicao + 1))
}

/// Recomputes item count and amounts of a batch from its items.
async fn refresh_batch<C: ConnectionTrait>(
    conn: &C,
    batch: payment_batches::Model,
) -> Result<payment_batches::Model, DbErr> {
    let items: Vec<(Decimal, BankStatusCode)> = batch_items(conn, batch.id)
        .await?
        .iter()
        .map(|i| (i.amount, BankStatusCode::parse(&i.estado_pagamento)))
        .collect();
    let summary = summarize_items(&items);

    let mut active: payment_batches::ActiveModel = batch.into();
    active.item_count = Set(i32::try_from(summary.item_count).unwrap_or(i32::MAX));
    active.total_amount = Set(summary.total_amount);
    active.validated_amount = Set(summary.validated_amount);
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await
}

async fn set_entries_status<C: ConnectionTrait>(
    conn: &C,
    entry_ids: &[Uuid],
    status: PaymentStatus,
) -> Result<(), DbErr> {
    if entry_ids.is_empty() {
        return Ok(());
    }
    payroll_entries::Entity::update_many()
        .col_expr(
            payroll_entries::Column::PaymentStatus,
            Expr::value(status.as_str()),
        )
        .col_expr(
            payroll_entries::Column::UpdatedAt,
            Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
        )
        .filter(payroll_entries::Column::Id.is_in(entry_ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(estado: &str) -> payment_batches::Model {
        let now = Utc::now().into();
        payment_batches::Model {
            id: Uuid::now_v7(),
            payroll_id: Some(Uuid::now_v7()),
            bank_account_id: Uuid::now_v7(),
            requisicao: 1,
            estado_requisicao: estado.to_string(),
            description: None,
            item_count: 1,
            total_amount: Decimal::ONE_HUNDRED,
            validated_amount: Decimal::ZERO,
            released_at: None,
            cancelled_at: None,
            created_by: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_cancelled_batch_rejects_state_updates() {
        let mut cancelled = batch(CANCELLED_BATCH_STATE);
        assert_eq!(ensure_not_cancelled(&cancelled), Err(PaymentError::BatchCancelled));

        cancelled.estado_requisicao = "1".to_string();
        cancelled.cancelled_at = Some(Utc::now().into());
        assert_eq!(ensure_not_cancelled(&cancelled), Err(PaymentError::BatchCancelled));
        assert_eq!(
            ensure_item_state_allowed(&cancelled, &BankStatusCode::parse("REJEITADO")),
            Err(PaymentError::BatchCancelled)
        );
    }

    #[test]
    fn test_unreleased_batch_cannot_settle_items() {
        let unreleased = batch("8");
        let paid = BankStatusCode::parse("PAGO");
        assert_eq!(
            ensure_item_state_allowed(&unreleased, &paid),
            Err(PaymentError::BatchNotReleased(paid.clone()))
        );
        assert!(ensure_item_state_allowed(&unreleased, &BankStatusCode::parse("PENDENTE")).is_ok());

        let mut released = batch("9");
        released.released_at = Some(Utc::now().into());
        assert!(ensure_item_state_allowed(&released, &paid).is_ok());
    }
}

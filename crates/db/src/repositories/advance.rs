//! Advance (adiantamento) repository.
//!
//! Also owns the per-entry reconciliation: which installments an entry
//! deducts and its avulso amount.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use safra_core::advance::{Advance, AdvanceError, AdvanceSelection, Installment, split_installments};
use safra_core::payroll::{PayrollError, PayrollWorkflow};
use safra_shared::types::{AdvanceId, EmployeeId, InstallmentId, PayrollEntryId};

use crate::entities::{advances, employees, installments, payroll_entries};

use super::payroll::{
    PayrollRepositoryError, find_entry, find_payroll, payroll_status, refresh_totals, save_entry,
};

/// Error types for advance operations.
#[derive(Debug, thiserror::Error)]
pub enum AdvanceRepositoryError {
    /// Advance not found.
    #[error("Advance not found: {0}")]
    AdvanceNotFound(Uuid),

    /// Employee not found.
    #[error("Employee not found: {0}")]
    EmployeeNotFound(Uuid),

    /// Advance rule violated.
    #[error(transparent)]
    Advance(#[from] AdvanceError),

    /// Payroll lookup or rule failed.
    #[error(transparent)]
    Payroll(#[from] PayrollRepositoryError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PayrollError> for AdvanceRepositoryError {
    fn from(err: PayrollError) -> Self {
        Self::Payroll(PayrollRepositoryError::Payroll(err))
    }
}

/// Input for granting an advance.
#[derive(Debug, Clone)]
pub struct CreateAdvanceInput {
    /// Employee receiving it.
    pub employee_id: Uuid,
    /// Amount paid out.
    pub total_amount: Decimal,
    /// Number of installments to deduct it in.
    pub installment_count: u32,
    /// Date paid.
    pub granted_on: NaiveDate,
    /// Free text.
    pub description: Option<String>,
    /// User granting it.
    pub created_by: Uuid,
}

/// Advance with its installments and outstanding balance.
#[derive(Debug, Clone)]
pub struct AdvanceWithInstallments {
    /// The advance.
    pub advance: advances::Model,
    /// Installments ordered by number.
    pub installments: Vec<installments::Model>,
    /// What the employee still owes.
    pub debt_balance: Decimal,
}

/// Advances state of one payroll entry.
#[derive(Debug, Clone)]
pub struct EntryAdvances {
    /// Entry the state belongs to.
    pub entry_id: Uuid,
    /// Linked installments plus avulso.
    pub selection: AdvanceSelection,
    /// Installments the entry may link: free ones and its own.
    pub available: Vec<Installment>,
    /// Sum of the linked installments.
    pub linked_total: Decimal,
    /// Total deduction stored on the entry.
    pub deduction_total: Decimal,
}

/// Advance repository.
#[derive(Debug, Clone)]
pub struct AdvanceRepository {
    db: DatabaseConnection,
}

impl AdvanceRepository {
    /// Creates a new advance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Grants an advance and splits it into installments.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The employee does not exist
    /// - The amount is not positive or the installment count is out of range
    pub async fn create(
        &self,
        input: CreateAdvanceInput,
    ) -> Result<AdvanceWithInstallments, AdvanceRepositoryError> {
        let parts = split_installments(input.total_amount, input.installment_count)?;

        let txn = self.db.begin().await?;
        employees::Entity::find_by_id(input.employee_id)
            .one(&txn)
            .await?
            .ok_or(AdvanceRepositoryError::EmployeeNotFound(input.employee_id))?;

        let now = Utc::now().into();
        let advance = advances::ActiveModel {
            id: Set(Uuid::now_v7()),
            employee_id: Set(input.employee_id),
            total_amount: Set(input.total_amount),
            granted_on: Set(input.granted_on),
            description: Set(input.description),
            created_by: Set(input.created_by),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut rows = Vec::with_capacity(parts.len());
        for (number, amount) in (1..).zip(parts) {
            let installment = installments::ActiveModel {
                id: Set(Uuid::now_v7()),
                advance_id: Set(advance.id),
                number: Set(number),
                amount: Set(amount),
                entry_id: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            rows.push(installment);
        }
        txn.commit().await?;

        Ok(with_balance(advance, rows))
    }

    /// Loads an advance with its installments.
    ///
    /// # Errors
    ///
    /// Returns `AdvanceNotFound` if it does not exist.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<AdvanceWithInstallments, AdvanceRepositoryError> {
        let advance = advances::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AdvanceRepositoryError::AdvanceNotFound(id))?;
        let rows = installments::Entity::find()
            .filter(installments::Column::AdvanceId.eq(id))
            .order_by_asc(installments::Column::Number)
            .all(&self.db)
            .await?;
        Ok(with_balance(advance, rows))
    }

    /// Lists advances, newest first, optionally for one employee and only
    /// those with an outstanding balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        employee_id: Option<Uuid>,
        only_open: bool,
    ) -> Result<Vec<AdvanceWithInstallments>, AdvanceRepositoryError> {
        let mut query = advances::Entity::find().order_by_desc(advances::Column::GrantedOn);
        if let Some(employee_id) = employee_id {
            query = query.filter(advances::Column::EmployeeId.eq(employee_id));
        }
        let rows = query
            .find_with_related(installments::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(advance, mut parts)| {
                parts.sort_by_key(|i| i.number);
                with_balance(advance, parts)
            })
            .filter(|a| !only_open || a.debt_balance > Decimal::ZERO)
            .collect())
    }

    /// Reads the advances state of a payroll entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the payroll or entry does not exist.
    pub async fn entry_advances(
        &self,
        payroll_id: Uuid,
        entry_id: Uuid,
    ) -> Result<EntryAdvances, AdvanceRepositoryError> {
        find_payroll(&self.db, payroll_id).await?;
        let entry = find_entry(&self.db, payroll_id, entry_id).await?;
        let all = employee_installments(&self.db, entry.employee_id).await?;
        Ok(entry_view(&entry, &all))
    }

    /// Replaces the installments and avulso an entry deducts, recomputing the
    /// entry and the payroll totals.
    ///
    /// The selection is the complete resulting set, not a delta.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payroll is not a draft
    /// - An installment is unknown or already deducted elsewhere
    /// - The avulso amount is negative
    pub async fn set_entry_advances(
        &self,
        payroll_id: Uuid,
        entry_id: Uuid,
        selection: AdvanceSelection,
    ) -> Result<(payroll_entries::Model, EntryAdvances), AdvanceRepositoryError> {
        let txn = self.db.begin().await?;

        let payroll = find_payroll(&txn, payroll_id).await?;
        PayrollWorkflow::ensure_editable(payroll_status(&payroll)?)?;
        let mut entry = find_entry(&txn, payroll_id, entry_id).await?;

        let all = employee_installments(&txn, entry.employee_id).await?;
        let deduction = selection.deduction_total(PayrollEntryId::from_uuid(entry.id), &all)?;

        let linked: Vec<Uuid> = selection
            .installment_ids
            .iter()
            .map(|id| id.into_inner())
            .collect();
        let now = chrono::DateTime::<chrono::FixedOffset>::from(Utc::now());

        installments::Entity::update_many()
            .col_expr(installments::Column::EntryId, Expr::value(Option::<Uuid>::None))
            .col_expr(installments::Column::UpdatedAt, Expr::value(now))
            .filter(installments::Column::EntryId.eq(entry.id))
            .filter(installments::Column::Id.is_not_in(linked.iter().copied()))
            .exec(&txn)
            .await?;
        if !linked.is_empty() {
            // Only free or already owned rows; a concurrent link elsewhere
            // leaves its row out of the count.
            let result = installments::Entity::update_many()
                .col_expr(installments::Column::EntryId, Expr::value(Some(entry.id)))
                .col_expr(installments::Column::UpdatedAt, Expr::value(now))
                .filter(installments::Column::Id.is_in(linked.iter().copied()))
                .filter(
                    Condition::any()
                        .add(installments::Column::EntryId.is_null())
                        .add(installments::Column::EntryId.eq(entry.id)),
                )
                .exec(&txn)
                .await?;
            if u64::try_from(linked.len()).ok() != Some(result.rows_affected) {
                let current = employee_installments(&txn, entry.employee_id).await?;
                selection.validate(PayrollEntryId::from_uuid(entry.id), &current)?;
                return Err(DbErr::RecordNotUpdated.into());
            }
        }

        entry.loose_advance = selection.loose_amount;
        entry.advance_deduction = deduction;
        let entry = save_entry(&txn, entry).await?;
        refresh_totals(&txn, payroll_id).await?;

        let all = employee_installments(&txn, entry.employee_id).await?;
        txn.commit().await?;

        let view = entry_view(&entry, &all);
        Ok((entry, view))
    }
}

fn to_core(row: &installments::Model) -> Installment {
    Installment {
        id: InstallmentId::from_uuid(row.id),
        advance_id: AdvanceId::from_uuid(row.advance_id),
        number: u32::try_from(row.number).unwrap_or(0),
        amount: row.amount,
        entry_id: row.entry_id.map(PayrollEntryId::from_uuid),
    }
}

fn with_balance(
    advance: advances::Model,
    rows: Vec<installments::Model>,
) -> AdvanceWithInstallments {
    let core = Advance {
        id: AdvanceId::from_uuid(advance.id),
        employee_id: EmployeeId::from_uuid(advance.employee_id),
        total_amount: advance.total_amount,
        granted_on: advance.granted_on,
        description: advance.description.clone(),
    };
    let parts: Vec<Installment> = rows.iter().map(to_core).collect();
    AdvanceWithInstallments {
        debt_balance: core.debt_balance(&parts),
        advance,
        installments: rows,
    }
}

fn entry_view(entry: &payroll_entries::Model, all: &[Installment]) -> EntryAdvances {
    let entry_key = PayrollEntryId::from_uuid(entry.id);
    let selection = AdvanceSelection::new(
        all.iter()
            .filter(|i| i.entry_id == Some(entry_key))
            .map(|i| i.id),
        entry.loose_advance,
    );
    let available: Vec<Installment> = all
        .iter()
        .filter(|i| i.entry_id.is_none() || i.entry_id == Some(entry_key))
        .cloned()
        .collect();

    EntryAdvances {
        entry_id: entry.id,
        linked_total: selection.linked_total(&available),
        selection,
        available,
        deduction_total: entry.advance_deduction,
    }
}

/// Every installment of the employee's advances, oldest advance first.
async fn employee_installments<C: ConnectionTrait>(
    conn: &C,
    employee_id: Uuid,
) -> Result<Vec<Installment>, DbErr> {
    let rows = installments::Entity::find()
        .join(JoinType::InnerJoin, installments::Relation::Advances.def())
        .filter(advances::Column::EmployeeId.eq(employee_id))
        .order_by_asc(advances::Column::GrantedOn)
        .order_by_asc(installments::Column::Number)
        .all(conn)
        .await?;
    Ok(rows.iter().map(to_core).collect())
}

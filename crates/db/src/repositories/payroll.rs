//! Payroll (folha) repository.
//!
//! Every entry mutation recomputes the entry with the core calculator and
//! refreshes the payroll totals inside the same database transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait, sea_query::Expr,
};
use tracing::debug;
use uuid::Uuid;

use safra_core::payroll::{
    ContractType, EntryFigures, FinalizationCandidate, PaymentMethod, PaymentStatus,
    PayrollAction, PayrollError, PayrollLineInput, PayrollPeriod, PayrollStatus, PayrollTotals,
    PayrollWorkflow, calculate,
};
use safra_shared::types::{PageRequest, PayrollEntryId, UserId};

use crate::entities::{employees, installments, payment_batches, payroll_entries, payrolls};

use super::employee::stored_pix_key;

/// Batch state written when a batch is cancelled locally.
pub(crate) const CANCELLED_BATCH_STATE: &str = "CANCELADO";

/// Error types for payroll operations.
#[derive(Debug, thiserror::Error)]
pub enum PayrollRepositoryError {
    /// Payroll not found.
    #[error("Payroll not found: {0}")]
    PayrollNotFound(Uuid),

    /// Entry not found in the payroll.
    #[error("Payroll entry not found: {0}")]
    EntryNotFound(Uuid),

    /// Employee not found.
    #[error("Employee not found: {0}")]
    EmployeeNotFound(Uuid),

    /// Another live payroll covers the same quinzena.
    #[error("A payroll already exists for {0}")]
    PeriodTaken(String),

    /// The employee already has an entry in this payroll.
    #[error("Employee {0} already has an entry in this payroll")]
    DuplicateEntry(Uuid),

    /// A payment batch that was not cancelled still references the payroll.
    #[error("Payment batch {0} is still open for this payroll")]
    BatchOpen(Uuid),

    /// Payroll rule violated.
    #[error(transparent)]
    Payroll(#[from] PayrollError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a payroll.
#[derive(Debug, Clone)]
pub struct CreatePayrollInput {
    /// Quinzena covered.
    pub period: PayrollPeriod,
    /// Free text.
    pub description: Option<String>,
    /// User creating it.
    pub created_by: Uuid,
}

/// Filter options for listing payrolls.
#[derive(Debug, Clone, Default)]
pub struct PayrollFilter {
    /// Filter by year.
    pub year: Option<i32>,
    /// Filter by month.
    pub month: Option<u32>,
    /// Filter by status.
    pub status: Option<PayrollStatus>,
}

/// Input for updating an entry. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateEntryInput {
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
    /// Overtime hour value.
    pub overtime_rate: Option<Decimal>,
    /// Cost allowance.
    pub cost_allowance: Option<Decimal>,
    /// Extras.
    pub extras: Option<Decimal>,
    /// Payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Notes; `Some(None)` clears them.
    pub notes: Option<Option<String>>,
}

/// Entry with the employee name for listing.
#[derive(Debug, Clone)]
pub struct EntryWithEmployee {
    /// The entry.
    pub entry: payroll_entries::Model,
    /// Employee name.
    pub employee_name: String,
}

/// Payroll with its entries.
#[derive(Debug, Clone)]
pub struct PayrollWithEntries {
    /// The payroll.
    pub payroll: payrolls::Model,
    /// Entries ordered by employee name.
    pub entries: Vec<EntryWithEmployee>,
}

/// Payroll repository.
#[derive(Debug, Clone)]
pub struct PayrollRepository {
    db: DatabaseConnection,
    default_monthly_days: u32,
}

impl PayrollRepository {
    /// Creates a new payroll repository.
    ///
    /// `default_monthly_days` is the days worked given to new MENSALISTA entries.
    #[must_use]
    pub const fn new(db: DatabaseConnection, default_monthly_days: u32) -> Self {
        Self {
            db,
            default_monthly_days,
        }
    }

    /// Creates an empty draft payroll for a quinzena.
    ///
    /// # Errors
    ///
    /// Returns `PeriodTaken` if a payroll that is not cancelled already covers the period.
    pub async fn create(
        &self,
        input: CreatePayrollInput,
    ) -> Result<payrolls::Model, PayrollRepositoryError> {
        let period = input.period;
        let month = to_i32(period.month);
        let quinzena = i32::from(period.quinzena.number());

        let existing = payrolls::Entity::find()
            .filter(payrolls::Column::Year.eq(period.year))
            .filter(payrolls::Column::Month.eq(month))
            .filter(payrolls::Column::Quinzena.eq(quinzena))
            .filter(payrolls::Column::Status.ne(PayrollStatus::Cancelada.as_str()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(PayrollRepositoryError::PeriodTaken(period.label()));
        }

        let now = Utc::now().into();
        let payroll = payrolls::ActiveModel {
            id: Set(Uuid::now_v7()),
            year: Set(period.year),
            month: Set(month),
            quinzena: Set(quinzena),
            description: Set(input.description),
            status: Set(PayrollStatus::Rascunho.as_str().to_string()),
            entry_count: Set(0),
            total_gross: Set(Decimal::ZERO),
            total_advances: Set(Decimal::ZERO),
            total_net: Set(Decimal::ZERO),
            created_by: Set(input.created_by),
            finalized_at: Set(None),
            finalized_by: Set(None),
            released_at: Set(None),
            closed_at: Set(None),
            cancelled_at: Set(None),
            cancelled_by: Set(None),
            cancel_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(payroll.insert(&self.db).await?)
    }

    /// Lists payrolls, most recent period first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: PayrollFilter,
        page: &PageRequest,
    ) -> Result<(Vec<payrolls::Model>, u64), PayrollRepositoryError> {
        let mut query = payrolls::Entity::find()
            .order_by_desc(payrolls::Column::Year)
            .order_by_desc(payrolls::Column::Month)
            .order_by_desc(payrolls::Column::Quinzena);

        if let Some(year) = filter.year {
            query = query.filter(payrolls::Column::Year.eq(year));
        }
        if let Some(month) = filter.month {
            query = query.filter(payrolls::Column::Month.eq(to_i32(month)));
        }
        if let Some(status) = filter.status {
            query = query.filter(payrolls::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok((rows, total))
    }

    /// Finds a payroll by id.
    ///
    /// # Errors
    ///
    /// Returns `PayrollNotFound` if it does not exist.
    pub async fn find_by_id(&self, id: Uuid) -> Result<payrolls::Model, PayrollRepositoryError> {
        find_payroll(&self.db, id).await
    }

    /// Loads a payroll with all its entries.
    ///
    /// # Errors
    ///
    /// Returns `PayrollNotFound` if it does not exist.
    pub async fn find_with_entries(
        &self,
        id: Uuid,
    ) -> Result<PayrollWithEntries, PayrollRepositoryError> {
        let payroll = find_payroll(&self.db, id).await?;
        let entries = load_entries(&self.db, id).await?;
        Ok(PayrollWithEntries { payroll, entries })
    }

    /// Adds entries for one employee, or for every active employee not yet in
    /// the payroll when `employee_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payroll does not exist or is not a draft
    /// - The employee does not exist or already has an entry
    pub async fn add_entries(
        &self,
        payroll_id: Uuid,
        employee_id: Option<Uuid>,
    ) -> Result<Vec<payroll_entries::Model>, PayrollRepositoryError> {
        let txn = self.db.begin().await?;

        let payroll = find_payroll(&txn, payroll_id).await?;
        PayrollWorkflow::ensure_editable(payroll_status(&payroll)?)?;

        let existing: Vec<Uuid> = payroll_entries::Entity::find()
            .filter(payroll_entries::Column::PayrollId.eq(payroll_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|e| e.employee_id)
            .collect();

        let candidates = match employee_id {
            Some(id) => {
                if existing.contains(&id) {
                    return Err(PayrollRepositoryError::DuplicateEntry(id));
                }
                let employee = employees::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or(PayrollRepositoryError::EmployeeNotFound(id))?;
                vec![employee]
            }
            None => employees::Entity::find()
                .filter(employees::Column::IsActive.eq(true))
                .order_by_asc(employees::Column::Name)
                .all(&txn)
                .await?
                .into_iter()
                .filter(|e| !existing.contains(&e.id))
                .collect(),
        };

        let mut created = Vec::with_capacity(candidates.len());
        for employee in candidates {
            let mut entry = self.new_entry(payroll_id, &employee);
            recalculate(&mut entry)?;
            let inserted = entry.into_active_model().reset_all().insert(&txn).await?;
            created.push(inserted);
        }

        refresh_totals(&txn, payroll_id).await?;
        txn.commit().await?;

        Ok(created)
    }

    fn new_entry(&self, payroll_id: Uuid, employee: &employees::Model) -> payroll_entries::Model {
        let contract_type = ContractType::parse(&employee.contract_type).unwrap_or_default();
        let days_worked = match contract_type {
            ContractType::Mensalista => to_i32(self.default_monthly_days),
            ContractType::Diarista => 0,
        };
        let payment_method = if stored_pix_key(employee).is_some() {
            PaymentMethod::Pix
        } else {
            PaymentMethod::Dinheiro
        };
        let now = Utc::now().into();

        payroll_entries::Model {
            id: Uuid::now_v7(),
            payroll_id,
            employee_id: employee.id,
            contract_type: contract_type.as_str().to_string(),
            base_salary: employee.base_salary,
            daily_rate: employee.daily_rate,
            days_worked,
            absences: 0,
            overtime_hours: Decimal::ZERO,
            overtime_rate: Decimal::ZERO,
            cost_allowance: Decimal::ZERO,
            extras: Decimal::ZERO,
            loose_advance: Decimal::ZERO,
            advance_deduction: Decimal::ZERO,
            gross_amount: Decimal::ZERO,
            net_amount: Decimal::ZERO,
            payment_status: PaymentStatus::Pendente.as_str().to_string(),
            payment_method: payment_method.as_str().to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Updates an entry and recomputes its amounts and the payroll totals.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payroll or entry does not exist
    /// - The payroll is not a draft
    /// - A value is negative or days exceed a quinzena
    pub async fn update_entry(
        &self,
        payroll_id: Uuid,
        entry_id: Uuid,
        input: UpdateEntryInput,
    ) -> Result<payroll_entries::Model, PayrollRepositoryError> {
        let txn = self.db.begin().await?;

        let payroll = find_payroll(&txn, payroll_id).await?;
        PayrollWorkflow::ensure_editable(payroll_status(&payroll)?)?;
        let mut entry = find_entry(&txn, payroll_id, entry_id).await?;

        if let Some(contract_type) = input.contract_type {
            entry.contract_type = contract_type.as_str().to_string();
        }
        if let Some(base_salary) = input.base_salary {
            entry.base_salary = base_salary;
        }
        if let Some(daily_rate) = input.daily_rate {
            entry.daily_rate = daily_rate;
        }
        if let Some(days_worked) = input.days_worked {
            entry.days_worked = to_i32(days_worked);
        }
        if let Some(absences) = input.absences {
            entry.absences = to_i32(absences);
        }
        if let Some(overtime_hours) = input.overtime_hours {
            entry.overtime_hours = overtime_hours;
        }
        if let Some(overtime_rate) = input.overtime_rate {
            entry.overtime_rate = overtime_rate;
        }
        if let Some(cost_allowance) = input.cost_allowance {
            entry.cost_allowance = cost_allowance;
        }
        if let Some(extras) = input.extras {
            entry.extras = extras;
        }
        if let Some(payment_method) = input.payment_method {
            entry.payment_method = payment_method.as_str().to_string();
        }
        if let Some(notes) = input.notes {
            entry.notes = notes;
        }

        let updated = save_entry(&txn, entry).await?;
        refresh_totals(&txn, payroll_id).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Removes an entry. Installments it deducted become free again.
    ///
    /// # Errors
    ///
    /// Returns an error if the payroll is not a draft or the entry does not exist.
    pub async fn delete_entry(
        &self,
        payroll_id: Uuid,
        entry_id: Uuid,
    ) -> Result<payrolls::Model, PayrollRepositoryError> {
        let txn = self.db.begin().await?;

        let payroll = find_payroll(&txn, payroll_id).await?;
        PayrollWorkflow::ensure_editable(payroll_status(&payroll)?)?;
        let entry = find_entry(&txn, payroll_id, entry_id).await?;

        release_installments(&txn, &[entry.id]).await?;
        payroll_entries::Entity::delete_by_id(entry.id)
            .exec(&txn)
            .await?;

        let payroll = refresh_totals(&txn, payroll_id).await?;
        txn.commit().await?;

        Ok(payroll)
    }

    /// Finalizes a draft payroll after checking every entry.
    ///
    /// # Errors
    ///
    /// Returns `FinalizationBlocked` listing every offending entry, or an
    /// invalid transition error.
    pub async fn finalize(
        &self,
        payroll_id: Uuid,
        user_id: Uuid,
    ) -> Result<payrolls::Model, PayrollRepositoryError> {
        let txn = self.db.begin().await?;

        let payroll = find_payroll(&txn, payroll_id).await?;
        let entries = load_entries(&txn, payroll_id).await?;
        let candidates: Vec<FinalizationCandidate> = entries
            .iter()
            .map(|e| FinalizationCandidate {
                entry_id: PayrollEntryId::from_uuid(e.entry.id),
                employee_name: e.employee_name.clone(),
                days_worked: u32::try_from(e.entry.days_worked).unwrap_or(0),
                gross_amount: e.entry.gross_amount,
                advance_deduction: e.entry.advance_deduction,
            })
            .collect();

        let action = PayrollWorkflow::finalize(
            payroll_status(&payroll)?,
            &candidates,
            UserId::from_uuid(user_id),
        )?;
        let updated = apply_action(&txn, payroll, &action).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Sends a finalized payroll back to draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the payroll is not awaiting release or a batch is open.
    pub async fn reopen(
        &self,
        payroll_id: Uuid,
        user_id: Uuid,
    ) -> Result<payrolls::Model, PayrollRepositoryError> {
        let txn = self.db.begin().await?;

        let payroll = find_payroll(&txn, payroll_id).await?;
        let action =
            PayrollWorkflow::reopen(payroll_status(&payroll)?, UserId::from_uuid(user_id))?;
        ensure_no_open_batch(&txn, payroll_id).await?;

        let updated = apply_action(&txn, payroll, &action).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Cancels a payroll and frees the installments its entries deducted.
    ///
    /// # Errors
    ///
    /// Returns an error if the reason is empty, the status does not allow
    /// cancelling, or a batch is open.
    pub async fn cancel(
        &self,
        payroll_id: Uuid,
        user_id: Uuid,
        reason: String,
    ) -> Result<payrolls::Model, PayrollRepositoryError> {
        let txn = self.db.begin().await?;

        let payroll = find_payroll(&txn, payroll_id).await?;
        let action = PayrollWorkflow::cancel(
            payroll_status(&payroll)?,
            UserId::from_uuid(user_id),
            reason.trim().to_string(),
        )?;
        ensure_no_open_batch(&txn, payroll_id).await?;

        let entry_ids: Vec<Uuid> = payroll_entries::Entity::find()
            .filter(payroll_entries::Column::PayrollId.eq(payroll_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
        release_installments(&txn, &entry_ids).await?;

        let updated = apply_action(&txn, payroll, &action).await?;
        txn.commit().await?;

        Ok(updated)
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Reads the stored status of a payroll.
pub(crate) fn payroll_status(payroll: &payrolls::Model) -> Result<PayrollStatus, DbErr> {
    PayrollStatus::parse(&payroll.status)
        .ok_or_else(|| DbErr::Type(format!("unknown payroll status '{}'", payroll.status)))
}

/// Builds the calculator input from a stored entry.
pub(crate) fn line_input(entry: &payroll_entries::Model) -> PayrollLineInput {
    PayrollLineInput {
        contract_type: ContractType::parse(&entry.contract_type).unwrap_or_default(),
        base_salary: entry.base_salary,
        daily_rate: entry.daily_rate,
        days_worked: u32::try_from(entry.days_worked).unwrap_or(0),
        overtime_hours: entry.overtime_hours,
        overtime_rate: entry.overtime_rate,
        cost_allowance: entry.cost_allowance,
        extras: entry.extras,
        advance_deduction: entry.advance_deduction,
    }
}

/// Validates an entry and writes its gross and net amounts.
pub(crate) fn recalculate(entry: &mut payroll_entries::Model) -> Result<(), PayrollError> {
    let input = line_input(entry);
    input.validate()?;
    let amounts = calculate(&input)?;
    entry.gross_amount = amounts.gross_amount;
    entry.net_amount = amounts.net_amount;
    Ok(())
}

/// Recalculates and stores an entry.
pub(crate) async fn save_entry<C: ConnectionTrait>(
    conn: &C,
    mut entry: payroll_entries::Model,
) -> Result<payroll_entries::Model, PayrollRepositoryError> {
    recalculate(&mut entry)?;
    entry.updated_at = Utc::now().into();
    Ok(entry.into_active_model().reset_all().update(conn).await?)
}

/// Recomputes the header totals from the stored entries.
pub(crate) async fn refresh_totals<C: ConnectionTrait>(
    conn: &C,
    payroll_id: Uuid,
) -> Result<payrolls::Model, PayrollRepositoryError> {
    let payroll = find_payroll(conn, payroll_id).await?;
    let entries = payroll_entries::Entity::find()
        .filter(payroll_entries::Column::PayrollId.eq(payroll_id))
        .all(conn)
        .await?;

    let totals = PayrollTotals::from_amounts(entries.iter().map(|e| EntryFigures {
        gross_amount: e.gross_amount,
        advance_deduction: e.advance_deduction,
        net_amount: e.net_amount,
    }));

    let mut active: payrolls::ActiveModel = payroll.into();
    active.entry_count = Set(to_i32(totals.entry_count));
    active.total_gross = Set(totals.total_gross);
    active.total_advances = Set(totals.total_advances);
    active.total_net = Set(totals.total_net);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

/// Persists a validated lifecycle transition.
pub(crate) async fn apply_action<C: ConnectionTrait>(
    conn: &C,
    payroll: payrolls::Model,
    action: &PayrollAction,
) -> Result<payrolls::Model, DbErr> {
    let mut active: payrolls::ActiveModel = payroll.into();
    active.status = Set(action.new_status().as_str().to_string());

    match action {
        PayrollAction::Finalize {
            finalized_by,
            finalized_at,
        } => {
            active.finalized_at = Set(Some((*finalized_at).into()));
            active.finalized_by = Set(Some(finalized_by.into_inner()));
        }
        PayrollAction::Reopen { .. } => {
            active.finalized_at = Set(None);
            active.finalized_by = Set(None);
        }
        PayrollAction::StartProcessing { released_at } => {
            active.released_at = Set(Some((*released_at).into()));
        }
        PayrollAction::Close { closed_at } => {
            active.closed_at = Set(Some((*closed_at).into()));
        }
        PayrollAction::Cancel {
            cancelled_by,
            cancelled_at,
            reason,
        } => {
            active.cancelled_at = Set(Some((*cancelled_at).into()));
            active.cancelled_by = Set(Some(cancelled_by.into_inner()));
            active.cancel_reason = Set(Some(reason.clone()));
        }
    }

    active.updated_at = Set(Utc::now().into());
    active.update(conn).await
}

pub(crate) async fn find_payroll<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<payrolls::Model, PayrollRepositoryError> {
    payrolls::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(PayrollRepositoryError::PayrollNotFound(id))
}

pub(crate) async fn find_entry<C: ConnectionTrait>(
    conn: &C,
    payroll_id: Uuid,
    entry_id: Uuid,
) -> Result<payroll_entries::Model, PayrollRepositoryError> {
    payroll_entries::Entity::find_by_id(entry_id)
        .filter(payroll_entries::Column::PayrollId.eq(payroll_id))
        .one(conn)
        .await?
        .ok_or(PayrollRepositoryError::EntryNotFound(entry_id))
}

async fn load_entries<C: ConnectionTrait>(
    conn: &C,
    payroll_id: Uuid,
) -> Result<Vec<EntryWithEmployee>, DbErr> {
    let rows = payroll_entries::Entity::find()
        .filter(payroll_entries::Column::PayrollId.eq(payroll_id))
        .find_also_related(employees::Entity)
        .order_by_asc(employees::Column::Name)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(entry, employee)| EntryWithEmployee {
            entry,
            employee_name: employee.map(|e| e.name).unwrap_or_default(),
        })
        .collect())
}

/// Unlinks every installment deducted from the given entries.
async fn release_installments<C: ConnectionTrait>(
    conn: &C,
    entry_ids: &[Uuid],
) -> Result<(), DbErr> {
    if entry_ids.is_empty() {
        return Ok(());
    }
    let released = installments::Entity::update_many()
        .col_expr(installments::Column::EntryId, Expr::value(Option::<Uuid>::None))
        .col_expr(
            installments::Column::UpdatedAt,
            Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
        )
        .filter(installments::Column::EntryId.is_in(entry_ids.iter().copied()))
        .exec(conn)
        .await?;
    debug!(
        entries = entry_ids.len(),
        installments = released.rows_affected,
        "Released installments"
    );
    Ok(())
}

async fn ensure_no_open_batch<C: ConnectionTrait>(
    conn: &C,
    payroll_id: Uuid,
) -> Result<(), PayrollRepositoryError> {
    let open = payment_batches::Entity::find()
        .filter(payment_batches::Column::PayrollId.eq(payroll_id))
        .filter(payment_batches::Column::EstadoRequisicao.ne(CANCELLED_BATCH_STATE))
        .one(conn)
        .await?;
    match open {
        Some(batch) => Err(PayrollRepositoryError::BatchOpen(batch.id)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry() -> payroll_entries::Model {
        let now = Utc::now().into();
        payroll_entries::Model {
            id: Uuid::now_v7(),
            payroll_id: Uuid::now_v7(),
            employee_id: Uuid::now_v7(),
            contract_type: "DIARISTA".to_string(),
            base_salary: dec!(0),
            daily_rate: dec!(90),
            days_worked: 10,
            absences: 1,
            overtime_hours: dec!(2),
            overtime_rate: dec!(15),
            cost_allowance: dec!(40),
            extras: dec!(0),
            loose_advance: dec!(0),
            advance_deduction: dec!(200),
            gross_amount: dec!(0),
            net_amount: dec!(0),
            payment_status: "PENDENTE".to_string(),
            payment_method: "PIX".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_recalculate_uses_calculator() {
        let mut entry = entry();
        recalculate(&mut entry).unwrap();
        assert_eq!(entry.gross_amount, dec!(970));
        assert_eq!(entry.net_amount, dec!(770));
    }

    #[test]
    fn test_recalculate_rejects_negative_values() {
        let mut entry = entry();
        entry.extras = dec!(-10);
        assert!(matches!(
            recalculate(&mut entry),
            Err(PayrollError::NegativeValue { field: "extras" })
        ));
    }

    #[test]
    fn test_recalculate_rejects_unstorable_gross() {
        let mut entry = entry();
        entry.contract_type = "DIARISTA".to_string();
        entry.days_worked = 16;
        entry.daily_rate = dec!(999999999999.99);
        assert!(matches!(
            recalculate(&mut entry),
            Err(PayrollError::AmountOutOfRange { field: "grossAmount" })
        ));
    }

    #[test]
    fn test_unknown_contract_type_is_monthly() {
        let mut entry = entry();
        entry.contract_type = "???".to_string();
        entry.base_salary = dec!(3000);
        assert_eq!(line_input(&entry).contract_type, ContractType::Mensalista);
    }
}

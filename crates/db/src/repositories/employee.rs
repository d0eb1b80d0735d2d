//! Employee (funcionário) repository.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use safra_core::payroll::ContractType;
use safra_core::pix::{PaymentError, PixKey, PixKeyType};
use safra_shared::types::PageRequest;

use crate::entities::employees;

/// Error types for employee operations.
#[derive(Debug, thiserror::Error)]
pub enum EmployeeError {
    /// Employee not found.
    #[error("Employee not found: {0}")]
    NotFound(Uuid),

    /// CPF already registered.
    #[error("CPF '{0}' is already registered")]
    DuplicateCpf(String),

    /// Salary or day rate below zero.
    #[error("{0} cannot be negative")]
    NegativeValue(&'static str),

    /// PIX key rejected.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an employee.
#[derive(Debug, Clone)]
pub struct CreateEmployeeInput {
    /// Full name.
    pub name: String,
    /// CPF, digits only or formatted.
    pub cpf: Option<String>,
    /// Contract type.
    pub contract_type: ContractType,
    /// Monthly salary.
    pub base_salary: Decimal,
    /// Day rate.
    pub daily_rate: Decimal,
    /// PIX key type and raw value.
    pub pix_key: Option<(PixKeyType, String)>,
}

/// Input for updating an employee. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateEmployeeInput {
    /// Full name.
    pub name: Option<String>,
    /// Contract type.
    pub contract_type: Option<ContractType>,
    /// Monthly salary.
    pub base_salary: Option<Decimal>,
    /// Day rate.
    pub daily_rate: Option<Decimal>,
    /// PIX key; `Some(None)` removes it.
    pub pix_key: Option<Option<(PixKeyType, String)>>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Filter options for listing employees.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    /// Only active (or only inactive) employees.
    pub is_active: Option<bool>,
    /// Name fragment.
    pub search: Option<String>,
}

/// Employee repository.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    db: DatabaseConnection,
}

impl EmployeeRepository {
    /// Creates a new employee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers an employee.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Salary or day rate is negative
    /// - CPF or PIX key is invalid
    /// - CPF is already registered
    pub async fn create(
        &self,
        input: CreateEmployeeInput,
    ) -> Result<employees::Model, EmployeeError> {
        check_amounts(input.base_salary, input.daily_rate)?;
        let cpf = input
            .cpf
            .as_deref()
            .map(|raw| PixKey::parse(PixKeyType::Cpf, raw).map(|key| key.value))
            .transpose()?;
        let pix_key = input
            .pix_key
            .map(|(key_type, raw)| PixKey::parse(key_type, &raw))
            .transpose()?;

        if let Some(cpf) = &cpf {
            let existing = employees::Entity::find()
                .filter(employees::Column::Cpf.eq(cpf.as_str()))
                .one(&self.db)
                .await?;
            if existing.is_some() {
                return Err(EmployeeError::DuplicateCpf(cpf.clone()));
            }
        }

        let now = chrono::Utc::now().into();
        let employee = employees::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name.trim().to_string()),
            cpf: Set(cpf),
            contract_type: Set(input.contract_type.as_str().to_string()),
            base_salary: Set(input.base_salary),
            daily_rate: Set(input.daily_rate),
            pix_key_type: Set(pix_key.as_ref().map(|k| k.key_type.as_str().to_string())),
            pix_key: Set(pix_key.map(|k| k.value)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(employee.insert(&self.db).await?)
    }

    /// Finds an employee by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the employee does not exist.
    pub async fn find_by_id(&self, id: Uuid) -> Result<employees::Model, EmployeeError> {
        employees::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(EmployeeError::NotFound(id))
    }

    /// Lists employees ordered by name, returning the page and the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: EmployeeFilter,
        page: &PageRequest,
    ) -> Result<(Vec<employees::Model>, u64), EmployeeError> {
        let mut query = employees::Entity::find().order_by_asc(employees::Column::Name);

        if let Some(is_active) = filter.is_active {
            query = query.filter(employees::Column::IsActive.eq(is_active));
        }
        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(employees::Column::Name.contains(search.trim()));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok((rows, total))
    }

    /// Lists every active employee, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<employees::Model>, EmployeeError> {
        Ok(employees::Entity::find()
            .filter(employees::Column::IsActive.eq(true))
            .order_by_asc(employees::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Updates an employee.
    ///
    /// # Errors
    ///
    /// Returns an error if the employee does not exist or a value is invalid.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateEmployeeInput,
    ) -> Result<employees::Model, EmployeeError> {
        let employee = self.find_by_id(id).await?;
        check_amounts(
            input.base_salary.unwrap_or(employee.base_salary),
            input.daily_rate.unwrap_or(employee.daily_rate),
        )?;

        let mut active: employees::ActiveModel = employee.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(contract_type) = input.contract_type {
            active.contract_type = Set(contract_type.as_str().to_string());
        }
        if let Some(base_salary) = input.base_salary {
            active.base_salary = Set(base_salary);
        }
        if let Some(daily_rate) = input.daily_rate {
            active.daily_rate = Set(daily_rate);
        }
        if let Some(pix_key) = input.pix_key {
            let pix_key = pix_key
                .map(|(key_type, raw)| PixKey::parse(key_type, &raw))
                .transpose()?;
            active.pix_key_type = Set(pix_key.as_ref().map(|k| k.key_type.as_str().to_string()));
            active.pix_key = Set(pix_key.map(|k| k.value));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deactivates an employee. Past payrolls keep their entries.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the employee does not exist.
    pub async fn deactivate(&self, id: Uuid) -> Result<employees::Model, EmployeeError> {
        self.update(
            id,
            UpdateEmployeeInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }
}

fn check_amounts(base_salary: Decimal, daily_rate: Decimal) -> Result<(), EmployeeError> {
    if base_salary < Decimal::ZERO {
        return Err(EmployeeError::NegativeValue("baseSalary"));
    }
    if daily_rate < Decimal::ZERO {
        return Err(EmployeeError::NegativeValue("dailyRate"));
    }
    Ok(())
}

/// Reads the stored PIX key of an employee, if complete.
pub(crate) fn stored_pix_key(employee: &employees::Model) -> Option<PixKey> {
    let key_type = PixKeyType::parse(employee.pix_key_type.as_deref()?)?;
    Some(PixKey {
        key_type,
        value: employee.pix_key.clone()?,
    })
}

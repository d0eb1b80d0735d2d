//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod advance;
pub mod employee;
pub mod payment;
pub mod payroll;

pub use advance::{
    AdvanceRepository, AdvanceRepositoryError, AdvanceWithInstallments, CreateAdvanceInput,
    EntryAdvances,
};
pub use employee::{
    CreateEmployeeInput, EmployeeError, EmployeeFilter, EmployeeRepository, UpdateEmployeeInput,
};
pub use payment::{
    BatchWithItems, CreateBankAccountInput, CreateBatchInput, ItemSettlement, PaymentRepository,
    PaymentRepositoryError,
};
pub use payroll::{
    CreatePayrollInput, EntryWithEmployee, PayrollFilter, PayrollRepository,
    PayrollRepositoryError, PayrollWithEntries, UpdateEntryInput,
};

//! `SeaORM` entities.

pub mod advances;
pub mod bank_accounts;
pub mod employees;
pub mod installments;
pub mod payment_batches;
pub mod payment_items;
pub mod payroll_entries;
pub mod payrolls;

//! Salary advances (adiantamentos).

pub mod error;
pub mod reconciliation;
pub mod types;

#[cfg(test)]
mod reconciliation_props;

pub use error::AdvanceError;
pub use reconciliation::AdvanceSelection;
pub use types::{Advance, Installment, MAX_INSTALLMENTS, split_installments};

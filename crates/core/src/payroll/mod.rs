//! Payroll (folha) domain.
//!
//! Line calculation, finalization rules, period math and the payroll
//! lifecycle state machine.

pub mod calculator;
pub mod error;
pub mod period;
pub mod totals;
pub mod types;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod calculator_props;
#[cfg(test)]
mod workflow_props;

pub use calculator::{MAX_DAYS_PER_PERIOD, PayrollAmounts, PayrollLineInput, calculate};
pub use error::PayrollError;
pub use period::{PayrollPeriod, Quinzena};
pub use totals::{EntryFigures, PayrollTotals};
pub use types::{ContractType, PaymentMethod, PaymentStatus, PayrollStatus};
pub use validation::{FinalizationCandidate, FinalizationIssue, IssueKind, validate_finalization};
pub use workflow::{PayrollAction, PayrollWorkflow};

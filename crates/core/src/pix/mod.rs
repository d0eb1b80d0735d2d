//! PIX payments through Banco do Brasil batches.

pub mod error;
pub mod key;
pub mod status;

#[cfg(test)]
mod status_props;

pub use error::PaymentError;
pub use key::{PixKey, PixKeyType};
pub use status::{
    BankStatusCode, BatchSummary, Settlement, Severity, StatusDisplay, StatusTable,
    batch_settlement, describe_batch_status, describe_item_status, ensure_cancel_allowed,
    ensure_release_allowed, status_table, summarize_items,
};

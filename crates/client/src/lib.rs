//! Client side of the payroll screens.
//!
//! This crate provides:
//! - `FolhaClient`, a bearer-token REST client for the payroll endpoints
//! - `AdvanceEditor`, the per-entry advance selection with server confirmation
//! - `EntryRowEditor`, the row editing state machine
//!
//! Amounts shown before the server answers come from the core calculator;
//! the formula is never repeated here.

pub mod advances;
pub mod error;
pub mod http;
pub mod rows;

pub use advances::{AdvanceEditor, AdvanceSync, AutosaveNotice, EntryAdvancesView};
pub use error::ClientError;
pub use http::FolhaClient;
pub use rows::{EntryRowEditor, RowState};

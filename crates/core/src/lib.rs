//! Core business logic for Safra.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `payroll` - Payroll line calculation, finalization rules and lifecycle
//! - `advance` - Salary advances, installments and per-entry reconciliation
//! - `pix` - Banco do Brasil batch status mapping and PIX keys

pub mod advance;
pub mod payroll;
pub mod pix;

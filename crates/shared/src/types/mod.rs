//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{CENTS_SCALE, floor_zero, format_brl, round_cents};
pub use pagination::{PageMeta, PageRequest, PageResponse};

//! Shared types for the budget snapshot pipeline.
//!
//! Holds the error type, the column schemas for expenditure and income
//! snapshots, the typed snapshot and incremental records, date helpers and
//! the command-line settings.

pub mod error;
pub mod models;
pub mod schema;
pub mod settings;
pub mod time_utils;

pub use error::{BudgetError, Result};

//! Loading and de-cumulation of monthly budget snapshots.
//!
//! [`loader`] turns a set of monthly JSON snapshot files into a month → table
//! mapping, [`decumulator`] converts that mapping into per-month increments,
//! and [`writer`] serialises the result.

pub mod decumulator;
pub mod loader;
pub mod writer;

pub use budget_core as core;
pub use decumulator::{decumulate, Decumulator};
pub use loader::{load, load_snapshots};

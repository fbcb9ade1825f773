//! Conversion of cumulative monthly snapshots into monthly increments.
//!
//! For every month `m > 1` the executed amounts of month `m-1` are subtracted
//! key by key from those of month `m`; a key missing on either side counts as
//! zero there. January is its own increment. The plan figure (`ADJUSTED`) is
//! never subtracted: each output row carries month `m`'s cumulative plan.

use std::collections::BTreeMap;

use budget_core::error::{BudgetError, Result};
use budget_core::models::{
    ClassificationKey, IncrementalRecord, IncrementalTable, MonthTable, MonthlySnapshots,
    SnapshotRecord,
};
use budget_core::schema::{ItemType, Schema};
use budget_core::time_utils::{parse_fiscal_year, period_date};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

pub use budget_core::models::VanishedKeyPolicy;

/// De-cumulate `snapshots` with the default [`VanishedKeyPolicy::Drop`].
pub fn decumulate(
    snapshots: &MonthlySnapshots,
    item_type: ItemType,
    fiscal_year: &str,
) -> Result<IncrementalTable> {
    Decumulator::new(item_type.schema()).run(snapshots, fiscal_year)
}

// ── Decumulator ───────────────────────────────────────────────────────────────

/// Turns a month → cumulative-table mapping into one flat incremental table.
#[derive(Debug, Clone, Copy)]
pub struct Decumulator {
    schema: &'static Schema,
    vanished_keys: VanishedKeyPolicy,
}

impl Decumulator {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            vanished_keys: VanishedKeyPolicy::default(),
        }
    }

    pub fn with_vanished_keys(mut self, policy: VanishedKeyPolicy) -> Self {
        self.vanished_keys = policy;
        self
    }

    /// Build the incremental table for `fiscal_year`.
    ///
    /// Months are processed from the latest down to January and the
    /// concatenated rows are then reversed as a whole, so blocks come out in
    /// ascending month order with the rows of each block in reverse.
    pub fn run(&self, snapshots: &MonthlySnapshots, fiscal_year: &str) -> Result<IncrementalTable> {
        let year = parse_fiscal_year(fiscal_year)?;

        if !snapshots.contains_key(&1) {
            return Err(BudgetError::IncompleteSeries);
        }

        let mut rows: Vec<IncrementalRecord> = Vec::new();
        for (&month, current) in snapshots.iter().rev() {
            let date = period_date(year, month)?;

            if month == 1 {
                rows.extend(self.january_block(current, date));
                continue;
            }

            let previous = snapshots
                .get(&(month - 1))
                .ok_or(BudgetError::MissingPredecessor {
                    month,
                    previous: month - 1,
                })?;
            rows.extend(self.month_block(current, previous, date));
        }
        rows.reverse();

        info!(
            "De-cumulated {} {} month(s) for {} into {} rows",
            snapshots.len(),
            self.schema.item_type,
            year,
            rows.len()
        );

        Ok(IncrementalTable {
            item_type: self.schema.item_type,
            rows,
        })
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// January has no predecessor: its cumulative rows are its increments.
    fn january_block(&self, january: &MonthTable, date: NaiveDate) -> Vec<IncrementalRecord> {
        january
            .rows
            .iter()
            .map(|row| IncrementalRecord {
                key: row.key.clone(),
                executed: row.executed,
                adjusted: row.adjusted,
                breakdowns: row.breakdowns.clone(),
                is_cumulative: row.is_cumulative,
                date,
            })
            .collect()
    }

    /// Subtract `previous` from `current` key by key, in ascending key order.
    fn month_block(
        &self,
        current: &MonthTable,
        previous: &MonthTable,
        date: NaiveDate,
    ) -> Vec<IncrementalRecord> {
        let current_index = current.index();
        let previous_index = previous.index();
        warn_on_repeated_keys(current, current_index.len());

        let mut appeared = 0usize;
        let mut vanished = 0usize;
        let mut block = Vec::with_capacity(current_index.len());

        for (key, cur) in &current_index {
            let record = match previous_index.get(key) {
                Some(prev) => self.delta(key, cur, prev, date),
                None => {
                    appeared += 1;
                    self.delta_from_zero(key, cur, date)
                }
            };
            block.push(record);
        }

        for (key, prev) in &previous_index {
            if current_index.contains_key(key) {
                continue;
            }
            vanished += 1;
            if self.vanished_keys == VanishedKeyPolicy::Reversal {
                block.push(self.reversal(key, prev, date));
            }
        }

        if self.vanished_keys == VanishedKeyPolicy::Reversal {
            block.sort_by(|a, b| a.key.cmp(&b.key));
        } else if vanished > 0 {
            warn!(
                "{} key(s) present in month {} are absent in month {} and were dropped",
                vanished,
                previous.month,
                current.month
            );
        }

        debug!(
            "Month {}: {} rows, {} new keys, {} vanished keys",
            current.month,
            block.len(),
            appeared,
            vanished
        );

        block
    }

    fn delta(
        &self,
        key: &ClassificationKey,
        cur: &SnapshotRecord,
        prev: &SnapshotRecord,
        date: NaiveDate,
    ) -> IncrementalRecord {
        IncrementalRecord {
            key: key.clone(),
            executed: cur.executed - prev.executed,
            adjusted: cur.adjusted,
            breakdowns: subtract_breakdowns(&cur.breakdowns, &prev.breakdowns),
            is_cumulative: self.schema.is_cumulative_row(key.values()),
            date,
        }
    }

    /// A key with no prior entry: the whole cumulative value is this month's.
    fn delta_from_zero(
        &self,
        key: &ClassificationKey,
        cur: &SnapshotRecord,
        date: NaiveDate,
    ) -> IncrementalRecord {
        IncrementalRecord {
            key: key.clone(),
            executed: cur.executed,
            adjusted: cur.adjusted,
            breakdowns: cur.breakdowns.clone(),
            is_cumulative: self.schema.is_cumulative_row(key.values()),
            date,
        }
    }

    fn reversal(
        &self,
        key: &ClassificationKey,
        prev: &SnapshotRecord,
        date: NaiveDate,
    ) -> IncrementalRecord {
        IncrementalRecord {
            key: key.clone(),
            executed: -prev.executed,
            adjusted: 0.0,
            breakdowns: prev
                .breakdowns
                .iter()
                .map(|(name, v)| (name.clone(), -v))
                .collect(),
            is_cumulative: self.schema.is_cumulative_row(key.values()),
            date,
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Column-wise `current - previous`, a column missing on one side counting
/// as zero there. Columns missing on both sides stay missing.
fn subtract_breakdowns(
    current: &BTreeMap<String, f64>,
    previous: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for name in current.keys().chain(previous.keys()) {
        if out.contains_key(name) {
            continue;
        }
        let cur = current.get(name).copied().unwrap_or(0.0);
        let prev = previous.get(name).copied().unwrap_or(0.0);
        out.insert(name.clone(), cur - prev);
    }
    out
}

fn warn_on_repeated_keys(table: &MonthTable, distinct: usize) {
    if distinct < table.len() {
        warn!(
            "Month {}: {} row(s) repeat a key with different values; the last one is used",
            table.month,
            table.len() - distinct
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

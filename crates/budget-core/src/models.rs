use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::schema::ItemType;
use crate::time_utils::format_period_date;

/// Composite classification key identifying one budget line.
///
/// Values are stored in the schema's key-column order, so two keys from the
/// same schema compare field by field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassificationKey(Vec<String>);

impl ClassificationKey {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

impl fmt::Display for ClassificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// One row of a monthly cumulative snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub key: ClassificationKey,
    /// Planned amount as of this month.
    pub adjusted: f64,
    /// Year-to-date executed amount as of this month.
    pub executed: f64,
    /// Optional per-funding-source execution columns present on this row.
    #[serde(default)]
    pub breakdowns: BTreeMap<String, f64>,
    /// Aggregate-row marker; `None` for income snapshots.
    #[serde(default)]
    pub is_cumulative: Option<bool>,
    pub month: u32,
}

/// Bit-exact identity of a row, used to drop duplicate rows.
type RowFingerprint = (ClassificationKey, u64, u64, Vec<(String, u64)>, Option<bool>, u32);

impl SnapshotRecord {
    fn fingerprint(&self) -> RowFingerprint {
        (
            self.key.clone(),
            self.adjusted.to_bits(),
            self.executed.to_bits(),
            self.breakdowns
                .iter()
                .map(|(k, v)| (k.clone(), v.to_bits()))
                .collect(),
            self.is_cumulative,
            self.month,
        )
    }
}

/// All rows of one month's snapshot, exact duplicates removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthTable {
    pub month: u32,
    pub rows: Vec<SnapshotRecord>,
}

impl MonthTable {
    /// Build a table from rows in file order, keeping the first of any
    /// exact-duplicate rows.
    ///
    /// Equality is judged on the parsed schema columns, not the raw JSON
    /// object: rows differing only in unrecognised fields, or in `"10"`
    /// versus `10`, count as duplicates.
    pub fn from_rows(month: u32, rows: Vec<SnapshotRecord>) -> Self {
        let mut seen: HashSet<RowFingerprint> = HashSet::with_capacity(rows.len());
        let rows = rows
            .into_iter()
            .filter(|row| seen.insert(row.fingerprint()))
            .collect();
        Self { month, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index rows by classification key. A key repeated with different
    /// values resolves to its last row.
    pub fn index(&self) -> BTreeMap<&ClassificationKey, &SnapshotRecord> {
        self.rows.iter().map(|row| (&row.key, row)).collect()
    }
}

/// Month number → that month's cumulative snapshot.
pub type MonthlySnapshots = BTreeMap<u32, MonthTable>;

/// What to emit for a key present in month `m-1` but absent in month `m`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VanishedKeyPolicy {
    /// Emit nothing for the key in month `m`.
    #[default]
    Drop,
    /// Emit a row reversing the key's prior cumulative execution, with a
    /// zero plan, so monthly totals still sum to the year-to-date figure.
    Reversal,
}

/// One row of the de-cumulated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementalRecord {
    pub key: ClassificationKey,
    /// Amount executed within this month alone.
    pub executed: f64,
    /// Planned amount as of this month, carried over unchanged.
    pub adjusted: f64,
    #[serde(default)]
    pub breakdowns: BTreeMap<String, f64>,
    #[serde(default)]
    pub is_cumulative: Option<bool>,
    pub date: NaiveDate,
}

impl IncrementalRecord {
    /// `DATE` column value, `YYYY-MM-01`.
    pub fn date_string(&self) -> String {
        format_period_date(self.date)
    }

    /// `IS_CUMULATIVE` column value as written to output.
    pub fn is_cumulative_flag(&self) -> Option<u8> {
        self.is_cumulative.map(u8::from)
    }
}

/// The flat de-cumulated table for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementalTable {
    pub item_type: ItemType,
    pub rows: Vec<IncrementalRecord>,
}

impl IncrementalTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows dated `date`, in table order.
    pub fn rows_for(&self, date: NaiveDate) -> impl Iterator<Item = &IncrementalRecord> {
        self.rows.iter().filter(move |r| r.date == date)
    }

    /// Look up the row for `key` on `date`.
    pub fn find(&self, key: &ClassificationKey, date: NaiveDate) -> Option<&IncrementalRecord> {
        self.rows.iter().find(|r| r.date == date && &r.key == key)
    }
}

//! Snapshot file discovery and loading.
//!
//! Each input file holds one month's cumulative snapshot as a JSON array of
//! flat objects. The month is taken from the file name (`..._MM.json`), every
//! row is checked against the item type's [`Schema`], and exact-duplicate rows
//! are dropped before the month's table is stored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use budget_core::error::{BudgetError, Result};
use budget_core::models::{ClassificationKey, MonthTable, MonthlySnapshots, SnapshotRecord};
use budget_core::schema::{ItemType, Schema, ADJUSTED, EXECUTED};
use budget_core::time_utils::month_from_token;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` files recursively under `data_path`, sorted by path.
pub fn find_snapshot_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand a mix of files and directories into the list of snapshot files.
///
/// Files are kept as given; directories are searched with
/// [`find_snapshot_files`]. A directory holding no snapshots is an error.
pub fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = find_snapshot_files(input);
            if found.is_empty() {
                return Err(BudgetError::NoDataFiles(input.clone()));
            }
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

/// Derive the month number from a snapshot file name.
///
/// The month is the last `_`-separated token of the file name with the
/// extension removed, e.g. `expenses_2022_03.json` → `3`.
pub fn month_from_path(path: &Path) -> Result<u32> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let token = file_name
        .rsplit('_')
        .next()
        .and_then(|last| last.split('.').next())
        .unwrap_or_default();

    month_from_token(token).ok_or_else(|| BudgetError::InvalidMonthToken {
        path: path.to_path_buf(),
        token: token.to_string(),
    })
}

/// Load the snapshot files of one item type into a month → table mapping.
pub fn load<P: AsRef<Path>>(files: &[P], item_type: ItemType) -> Result<MonthlySnapshots> {
    load_snapshots(files, item_type.schema())
}

/// Load every snapshot file into a month → table mapping.
///
/// Fails on the first unreadable file, malformed row, unrecognised month
/// token, or month supplied by more than one file.
pub fn load_snapshots<P: AsRef<Path>>(files: &[P], schema: &Schema) -> Result<MonthlySnapshots> {
    let mut snapshots: MonthlySnapshots = BTreeMap::new();

    for file in files {
        let path = file.as_ref();
        let table = load_month_file(path, schema)?;
        let month = table.month;
        if snapshots.contains_key(&month) {
            return Err(BudgetError::DuplicateMonth {
                month,
                path: path.to_path_buf(),
            });
        }
        snapshots.insert(month, table);
    }

    info!(
        "Loaded {} {} snapshot(s), months {:?}",
        snapshots.len(),
        schema.item_type,
        snapshots.keys().collect::<Vec<_>>()
    );

    Ok(snapshots)
}

/// Read and parse a single snapshot file.
pub fn load_month_file(path: &Path, schema: &Schema) -> Result<MonthTable> {
    let month = month_from_path(path)?;

    let content = std::fs::read_to_string(path).map_err(|source| BudgetError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let data: Value = serde_json::from_str(&content).map_err(|source| BudgetError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })?;

    parse_month_table(&data, month, schema, path)
}

/// Convert a parsed JSON array into the month's deduplicated table.
///
/// `source` is only used to give errors a location.
pub fn parse_month_table(
    data: &Value,
    month: u32,
    schema: &Schema,
    source: &Path,
) -> Result<MonthTable> {
    let items = data.as_array().ok_or_else(|| BudgetError::SchemaViolation {
        path: source.to_path_buf(),
        row: 0,
        column: "<root>".to_string(),
        reason: "expected a JSON array of records".to_string(),
    })?;

    let mut rows = Vec::with_capacity(items.len());
    for (row, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| BudgetError::SchemaViolation {
            path: source.to_path_buf(),
            row,
            column: "<row>".to_string(),
            reason: "expected a JSON object".to_string(),
        })?;
        rows.push(parse_record(obj, row, month, schema, source)?);
    }

    let rows_read = rows.len();
    let table = MonthTable::from_rows(month, rows);

    debug!(
        "File {}: month {}, {} rows read, {} duplicates dropped",
        source.display(),
        month,
        rows_read,
        rows_read - table.len(),
    );

    Ok(table)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Map one JSON object to a [`SnapshotRecord`].
fn parse_record(
    obj: &Map<String, Value>,
    row: usize,
    month: u32,
    schema: &Schema,
    source: &Path,
) -> Result<SnapshotRecord> {
    let violation = |column: &str, reason: &str| BudgetError::SchemaViolation {
        path: source.to_path_buf(),
        row,
        column: column.to_string(),
        reason: reason.to_string(),
    };

    let mut key_values = Vec::with_capacity(schema.key_columns.len());
    for column in schema.key_columns {
        match obj.get(*column) {
            Some(Value::String(s)) => key_values.push(s.clone()),
            Some(_) => return Err(violation(*column, "expected a string")),
            None => return Err(violation(*column, "missing")),
        }
    }

    let adjusted = required_number(obj, ADJUSTED).map_err(|reason| violation(ADJUSTED, reason))?;
    let executed = required_number(obj, EXECUTED).map_err(|reason| violation(EXECUTED, reason))?;

    let mut breakdowns = BTreeMap::new();
    for column in schema.breakdown_columns {
        let value =
            optional_number(obj, column).map_err(|reason| violation(*column, reason))?;
        if let Some(v) = value {
            breakdowns.insert(column.to_string(), v);
        }
    }

    let is_cumulative = schema.is_cumulative_row(&key_values);

    Ok(SnapshotRecord {
        key: ClassificationKey::new(key_values),
        adjusted,
        executed,
        breakdowns,
        is_cumulative,
        month,
    })
}

fn required_number(obj: &Map<String, Value>, column: &str) -> std::result::Result<f64, &'static str> {
    match obj.get(column) {
        None | Some(Value::Null) => Err("missing"),
        Some(value) => numeric_value(value).ok_or("expected a finite number"),
    }
}

fn optional_number(
    obj: &Map<String, Value>,
    column: &str,
) -> std::result::Result<Option<f64>, &'static str> {
    match obj.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => numeric_value(value)
            .map(Some)
            .ok_or("expected a finite number"),
    }
}

/// Accept JSON numbers and numeric strings; reject everything else.
fn numeric_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Key-based replacement merge of an increment into the master dataset.

use std::collections::HashSet;
use std::str::FromStr;

use thiserror::Error;

use crate::table::{Table, Value};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("{table} table is missing key column '{column}'")]
    MissingKeyColumn { table: &'static str, column: String },
}

/// What to do with duplicate keys inside the increment. Replacement of
/// master rows is unconditional either way; the policy only governs whether
/// the merged result may carry more than one row per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Keep every increment row, duplicates included.
    #[default]
    KeepAll,
    /// After merging, keep only the last row for each key value.
    KeepLastByPosition,
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "keep-all" => Ok(MergePolicy::KeepAll),
            "keep-last-by-position" | "keep-last" => Ok(MergePolicy::KeepLastByPosition),
            other => Err(format!(
                "unknown merge policy '{other}' (expected 'keep-all' or 'keep-last-by-position')"
            )),
        }
    }
}

/// Merge `increment` into `master` on `key`.
///
/// Every master row whose key appears anywhere in the increment is dropped;
/// the increment is then appended after the surviving master rows, each
/// side keeping its internal order. The result's column set is the union of
/// both tables' columns (master's first), with absent cells padded empty.
pub fn merge_increment(
    master: Table,
    increment: Table,
    key: &str,
    policy: MergePolicy,
) -> Result<Table, MergeError> {
    let master_key = master
        .column_index(key)
        .ok_or_else(|| MergeError::MissingKeyColumn {
            table: "master",
            column: key.to_string(),
        })?;
    let increment_key = increment
        .column_index(key)
        .ok_or_else(|| MergeError::MissingKeyColumn {
            table: "increment",
            column: key.to_string(),
        })?;

    let incoming_keys: HashSet<&str> = increment
        .rows()
        .iter()
        .map(|row| row[increment_key].render())
        .collect();

    // Column union, master's columns first; remember where each increment
    // column lands in the result.
    let mut columns: Vec<String> = master.columns().to_vec();
    let mut increment_targets: Vec<usize> = Vec::with_capacity(increment.width());
    for column in increment.columns() {
        match columns.iter().position(|existing| existing == column) {
            Some(position) => increment_targets.push(position),
            None => {
                columns.push(column.clone());
                increment_targets.push(columns.len() - 1);
            }
        }
    }

    let width = columns.len();
    let mut result = Table::new(columns);

    for row in master.rows() {
        if incoming_keys.contains(row[master_key].render()) {
            continue;
        }
        result.push_row(row.clone());
    }

    for row in increment.rows() {
        let mut placed = vec![Value::text(""); width];
        for (source, &target) in row.iter().zip(&increment_targets) {
            placed[target] = source.clone();
        }
        result.push_row(placed);
    }

    if policy == MergePolicy::KeepLastByPosition {
        dedupe_keep_last(&mut result, master_key);
    }

    Ok(result)
}

/// Keep only the last occurrence of each key value, preserving the order of
/// the surviving rows.
fn dedupe_keep_last(table: &mut Table, key_index: usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = vec![false; table.rows.len()];

    for (position, row) in table.rows.iter().enumerate().rev() {
        let key = row[key_index].render().to_string();
        if seen.insert(key) {
            keep[position] = true;
        }
    }

    let mut keep = keep.into_iter();
    table.rows.retain(|_| keep.next().unwrap_or(false));
}

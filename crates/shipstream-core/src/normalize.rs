//! Schema and value normalization for freshly read increments.
//!
//! Headers are folded and renamed first; values are then trimmed,
//! upper-cased, and flag columns mapped onto booleans where the yes/no
//! vocabulary matches. Tables move through by value; callers never observe
//! a half-normalized table.

use crate::schema::{ColumnMap, FLAG_COLUMNS};
use crate::table::{Table, Value};

/// Upstream writes this sentinel where a field has no value.
const EMPTY_SENTINEL: &str = "()";

/// Schema normalization: fold line breaks embedded in headers to single
/// spaces, then rename headers through the canonical map. Unmapped headers
/// pass through unchanged; rows are untouched.
pub fn normalize_headers(mut table: Table, columns: &ColumnMap) -> Table {
    for column in &mut table.columns {
        if column.contains('\n') || column.contains('\r') {
            *column = fold_line_breaks(column);
        }
        if let Some(canonical) = columns.resolve(column) {
            *column = canonical.to_string();
        }
    }
    table
}

fn fold_line_breaks(header: &str) -> String {
    header
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

/// Value normalization: trim and upper-case every text cell, blank out the
/// `()` no-value sentinel, then convert flag columns to booleans where the
/// value is recognized. Unrecognized flag values stay as their normalized
/// text so downstream can tell "no" from "not an answer".
pub fn normalize_values(mut table: Table) -> Table {
    for row in &mut table.rows {
        for cell in row.iter_mut() {
            if let Value::Text(text) = cell {
                *cell = Value::Text(normalize_text(text));
            }
        }
    }

    let flag_indexes: Vec<usize> = FLAG_COLUMNS
        .iter()
        .filter_map(|flag| table.column_index(flag))
        .collect();

    for row in &mut table.rows {
        for &index in &flag_indexes {
            if let Value::Text(text) = &row[index] {
                if let Some(flag) = flag_from_text(text) {
                    row[index] = Value::Bool(flag);
                }
            }
        }
    }

    table
}

fn normalize_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == EMPTY_SENTINEL {
        String::new()
    } else {
        trimmed.to_uppercase()
    }
}

/// Partial mapping from normalized flag text to boolean. `None` means the
/// value is outside the yes/no vocabulary and must be left alone.
fn flag_from_text(text: &str) -> Option<bool> {
    match text {
        "Y" | "YES" => Some(true),
        "N" | "NO" => Some(false),
        _ => None,
    }
}

/// Full normalization applied to an increment before merging.
pub fn normalize_increment(table: Table, columns: &ColumnMap) -> Table {
    normalize_values(normalize_headers(table, columns))
}

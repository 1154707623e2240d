//! Record normalization: loose model records → canonical loading table.
//!
//! Records arrive as insertion-ordered field maps with possibly heterogeneous
//! keys — the model may omit `Carrier` on one row and add a `Note` field on
//! another. The normalizer imposes exactly two guarantees without touching
//! values:
//!
//! 1. **Serial renumbering** — `Serial` is reassigned as a 1-based sequential
//!    integer in input order. Whatever the model put there is discarded; the
//!    model occasionally restarts numbering per table column.
//!
//! 2. **Canonical column order** — `Serial, Qty, Type, Carrier, Elevation`
//!    (the subset present) come first, then every other observed key in
//!    first-seen order. Rows are re-projected into that order so the JSON
//!    output's field order matches the spreadsheet's header row.
//!
//! No type coercion happens here: integer elevations and quantity defaults
//! are the model's responsibility per the prompt contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::parse::Record;

/// The five fields every loading table is expected to carry, in output order.
pub const CANONICAL_COLUMNS: [&str; 5] = ["Serial", "Qty", "Type", "Carrier", "Elevation"];

/// Canonical table of extracted rows for one source image.
///
/// `columns` is the spreadsheet header order; each row's fields are stored in
/// that same order (keys a row lacks are simply absent from it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingTable {
    /// Header order: canonical columns first, extras in first-seen order.
    pub columns: Vec<String>,
    /// One record per table entry, fields ordered per `columns`.
    pub rows: Vec<Record>,
}

impl LoadingTable {
    /// `true` when no rows were extracted; callers skip writing output.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of extracted rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Normalize a parsed record sequence into a canonical [`LoadingTable`].
///
/// Empty input yields an empty table with no columns.
pub fn normalize(records: Vec<Record>) -> LoadingTable {
    if records.is_empty() {
        return LoadingTable {
            columns: Vec::new(),
            rows: Vec::new(),
        };
    }

    let columns = column_order(&records);

    let rows = records
        .into_iter()
        .enumerate()
        .map(|(i, mut record)| {
            record.insert("Serial".to_string(), Value::from(i as u64 + 1));
            project(&record, &columns)
        })
        .collect();

    LoadingTable { columns, rows }
}

/// Compute the output column order for a record set.
///
/// Canonical columns that appear in at least one record come first, in fixed
/// relative order (`Serial` always qualifies — the normalizer inserts it).
/// Remaining keys follow in first-seen order across records.
fn column_order(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();

    for canonical in CANONICAL_COLUMNS {
        if canonical == "Serial" || records.iter().any(|r| r.contains_key(canonical)) {
            columns.push(canonical.to_string());
        }
    }

    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    columns
}

/// Rebuild a record with its fields in `columns` order, dropping nothing.
fn project(record: &Record, columns: &[String]) -> Record {
    let mut out = Map::with_capacity(record.len());
    for col in columns {
        if let Some(v) = record.get(col) {
            out.insert(col.clone(), v.clone());
        }
    }
    out
}

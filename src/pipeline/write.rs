//! Output writing: one `<base>.xlsx` / `<base>.json` pair per image.
//!
//! Both files carry the same rows in the same order. The spreadsheet gets a
//! bold header row and no index column; the JSON file is a record-oriented,
//! 2-space-indented array whose field order matches the header row (the
//! normalizer already projected every row into column order). Each run fully
//! overwrites any prior output pair with the same base name.

use crate::output::OutputPaths;
use crate::table::LoadingTable;
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// A filesystem or serialisation failure while writing one output file.
#[derive(Debug, Error)]
#[error("{path}: {detail}")]
pub struct WriteError {
    pub path: PathBuf,
    pub detail: String,
}

impl WriteError {
    fn new(path: &Path, detail: impl ToString) -> Self {
        Self {
            path: path.to_path_buf(),
            detail: detail.to_string(),
        }
    }
}

/// Write the spreadsheet/JSON pair for one image's table.
///
/// `output_dir` must already exist (the batch driver creates it once up
/// front). Callers are expected to skip this entirely for empty tables.
pub fn write_outputs(
    table: &LoadingTable,
    base_name: &str,
    output_dir: &Path,
) -> Result<OutputPaths, WriteError> {
    let xlsx_path = output_dir.join(format!("{base_name}.xlsx"));
    let json_path = output_dir.join(format!("{base_name}.json"));

    write_xlsx(table, &xlsx_path)?;
    write_json(table, &json_path)?;

    info!("Saved: {} and {}", xlsx_path.display(), json_path.display());
    Ok(OutputPaths {
        xlsx: xlsx_path,
        json: json_path,
    })
}

fn write_xlsx(table: &LoadingTable, path: &Path) -> Result<(), WriteError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &bold)
            .map_err(|e| WriteError::new(path, e))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let r = (row_idx + 1) as u32;
        for (col, name) in table.columns.iter().enumerate() {
            let c = col as u16;
            match row.get(name) {
                Some(Value::Number(n)) => {
                    // xlsx cells are f64; i64 values round-trip exactly up to 2^53
                    let v = n.as_f64().unwrap_or(f64::NAN);
                    worksheet
                        .write_number(r, c, v)
                        .map_err(|e| WriteError::new(path, e))?;
                }
                Some(Value::String(s)) => {
                    worksheet
                        .write_string(r, c, s.as_str())
                        .map_err(|e| WriteError::new(path, e))?;
                }
                Some(Value::Bool(b)) => {
                    worksheet
                        .write_boolean(r, c, *b)
                        .map_err(|e| WriteError::new(path, e))?;
                }
                // Nulls and absent fields leave the cell blank, like pandas.
                Some(Value::Null) | None => {}
                Some(other) => {
                    worksheet
                        .write_string(r, c, other.to_string())
                        .map_err(|e| WriteError::new(path, e))?;
                }
            }
        }
    }

    workbook.save(path).map_err(|e| WriteError::new(path, e))
}

fn write_json(table: &LoadingTable, path: &Path) -> Result<(), WriteError> {
    let json =
        serde_json::to_string_pretty(&table.rows).map_err(|e| WriteError::new(path, e))?;
    std::fs::write(path, json).map_err(|e| WriteError::new(path, e))
}

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::loader::{extension, load_workbook_sheets};
use super::model::{CellValue, Column, Dataset};

/// Sheet name used when the caller does not pick one.
pub const DEFAULT_SHEET: &str = "clean";

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePolicy {
    /// Rewrite the file so it holds only the saved sheet.
    #[default]
    Replace,
    /// Add the sheet to an existing workbook (`.xlsx` or JSON). Single-table
    /// formats have no sheets to add to.
    AppendSheet,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Save a dataset to a file.  Dispatch by extension, like the loader.
///
/// Missing values become blank spreadsheet cells, empty CSV fields, JSON
/// `null`s and Parquet nulls.
pub fn save_dataset(
    dataset: &Dataset,
    path: &Path,
    sheet_name: &str,
    policy: SavePolicy,
) -> Result<()> {
    let ext = extension(path);
    if policy == SavePolicy::AppendSheet && !matches!(ext.as_str(), "xlsx" | "json") {
        bail!(
            "{} holds a single table; cannot append sheet '{sheet_name}'",
            path.display()
        );
    }

    let written = match ext.as_str() {
        "xlsx" => save_xlsx(dataset, path, sheet_name, policy),
        "parquet" | "pq" => save_parquet(dataset, path),
        "json" => save_json(dataset, path, sheet_name, policy),
        "csv" => save_csv(dataset, path),
        other => bail!("Unsupported file extension: .{other}"),
    };
    written.with_context(|| format!("saving {}", path.display()))?;

    log::info!(
        "Saved {} rows to {} (sheet '{sheet_name}', {policy:?})",
        dataset.len(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Spreadsheet writer
// ---------------------------------------------------------------------------

/// Write an `.xlsx` workbook.
///
/// Appending reads the existing sheets back and writes them out again ahead
/// of the new one; their values survive, cell styling does not.
fn save_xlsx(dataset: &Dataset, path: &Path, sheet_name: &str, policy: SavePolicy) -> Result<()> {
    let existing = match policy {
        SavePolicy::AppendSheet if path.exists() => {
            load_workbook_sheets(path).context("reading existing workbook")?
        }
        _ => Vec::new(),
    };
    if existing.iter().any(|(name, _)| name == sheet_name) {
        bail!("sheet '{sheet_name}' already exists");
    }

    let mut workbook = Workbook::new();
    for (name, sheet) in &existing {
        write_sheet(workbook.add_worksheet(), name, sheet)?;
    }
    write_sheet(workbook.add_worksheet(), sheet_name, dataset)?;
    workbook.save(path).context("writing workbook")?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, name: &str, dataset: &Dataset) -> Result<()> {
    worksheet
        .set_name(name)
        .with_context(|| format!("naming sheet '{name}'"))?;
    for (col_idx, column) in dataset.columns().iter().enumerate() {
        let col = u16::try_from(col_idx).context("too many columns for a worksheet")?;
        worksheet.write_string(0, col, column.name.as_str())?;
        for (row_idx, cell) in column.cells.iter().enumerate() {
            let row = u32::try_from(row_idx + 1).context("too many rows for a worksheet")?;
            match cell {
                CellValue::String(s) => {
                    worksheet.write_string(row, col, s.as_str())?;
                }
                CellValue::Integer(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                CellValue::Float(f) if f.is_finite() => {
                    worksheet.write_number(row, col, *f)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                // Missing samples stay blank.
                CellValue::Float(_) | CellValue::Null => {}
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON writer
// ---------------------------------------------------------------------------

fn save_json(dataset: &Dataset, path: &Path, sheet_name: &str, policy: SavePolicy) -> Result<()> {
    let mut sheets = match policy {
        SavePolicy::AppendSheet if path.exists() => {
            let text = std::fs::read_to_string(path).context("reading existing workbook")?;
            match serde_json::from_str(&text).context("parsing existing workbook")? {
                JsonValue::Object(sheets) => sheets,
                JsonValue::Array(_) => {
                    bail!("existing file holds a single table, not a workbook")
                }
                _ => bail!("existing file is not a workbook"),
            }
        }
        _ => Map::new(),
    };

    if sheets.contains_key(sheet_name) {
        bail!("sheet '{sheet_name}' already exists");
    }
    sheets.insert(sheet_name.to_string(), dataset_to_records(dataset));

    let file = File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(file, &JsonValue::Object(sheets)).context("writing JSON")?;
    Ok(())
}

fn dataset_to_records(dataset: &Dataset) -> JsonValue {
    let records = (0..dataset.len())
        .map(|row| {
            let obj: Map<String, JsonValue> = dataset
                .columns()
                .iter()
                .map(|col| (col.name.clone(), cell_to_json(&col.cells[row])))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(records)
}

fn cell_to_json(cell: &CellValue) -> JsonValue {
    match cell {
        CellValue::String(s) => JsonValue::String(s.clone()),
        CellValue::Integer(i) => JsonValue::from(*i),
        // Non-finite floats have no JSON form and are written as null.
        CellValue::Float(f) => serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        CellValue::Bool(b) => JsonValue::Bool(*b),
        CellValue::Null => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

fn save_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer
        .write_record(dataset.columns().iter().map(|c| c.name.as_str()))
        .context("writing CSV headers")?;
    for row in 0..dataset.len() {
        writer
            .write_record(dataset.columns().iter().map(|c| cell_to_field(&c.cells[row])))
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn cell_to_field(cell: &CellValue) -> String {
    match cell {
        // Debug keeps the decimal point, so floats read back as floats.
        CellValue::Float(f) if f.is_finite() => format!("{f:?}"),
        CellValue::Float(_) | CellValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

fn save_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) =
        dataset.columns().iter().map(column_to_arrow).unzip();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Pick the narrowest Arrow type that holds every cell of the column.
fn column_to_arrow(col: &Column) -> (Field, ArrayRef) {
    let non_null = || col.cells.iter().filter(|c| **c != CellValue::Null);
    let all_ints = non_null().all(|c| matches!(c, CellValue::Integer(_)));
    let all_numbers = non_null().all(|c| matches!(c, CellValue::Integer(_) | CellValue::Float(_)));
    let all_bools = non_null().all(|c| matches!(c, CellValue::Bool(_)));

    let (data_type, array): (DataType, ArrayRef) = if all_ints {
        let values: Int64Array = col
            .cells
            .iter()
            .map(|c| match c {
                CellValue::Integer(i) => Some(*i),
                _ => None,
            })
            .collect();
        (DataType::Int64, Arc::new(values))
    } else if all_numbers {
        let values: Float64Array = col
            .cells
            .iter()
            .map(|c| match c {
                CellValue::Integer(i) => Some(*i as f64),
                CellValue::Float(f) if !f.is_nan() => Some(*f),
                _ => None,
            })
            .collect();
        (DataType::Float64, Arc::new(values))
    } else if all_bools {
        let values: BooleanArray = col
            .cells
            .iter()
            .map(|c| match c {
                CellValue::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        (DataType::Boolean, Arc::new(values))
    } else {
        let values: StringArray = col
            .cells
            .iter()
            .map(|c| match c {
                CellValue::Null => None,
                other => Some(other.to_string()),
            })
            .collect();
        (DataType::Utf8, Arc::new(values))
    };

    (Field::new(col.name.as_str(), data_type, true), array)
}

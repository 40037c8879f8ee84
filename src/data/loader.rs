use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Range, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::model::{CellValue, Column, Dataset};

/// Which sheet of a file to read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelector {
    /// The first (or only) sheet.
    #[default]
    Default,
    Named(String),
}

impl From<Option<String>> for SheetSelector {
    fn from(name: Option<String>) -> Self {
        name.map_or(SheetSelector::Default, SheetSelector::Named)
    }
}

/// Lower-cased file extension, empty if there is none.
pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – spreadsheet workbook, header row
///   on top of each sheet
/// * `.parquet` – flat Parquet table, one column per variable
/// * `.json`    – `[{ "col": value, ... }, ...]` or a workbook
///   `{ "sheet": [records...], ... }`
/// * `.csv`     – header row followed by records
///
/// Spreadsheets and JSON workbooks have named sheets; the default selector
/// picks the first one.
pub fn load_dataset(path: &Path, sheet: &SheetSelector) -> Result<Dataset> {
    let dataset = match extension(path).as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path, sheet),
        "parquet" | "pq" => {
            single_table(path, sheet)?;
            load_parquet(path)
        }
        "json" => load_json(path, sheet),
        "csv" => {
            single_table(path, sheet)?;
            load_csv(path)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.column_names(),
        path.display()
    );
    Ok(dataset)
}

fn single_table(path: &Path, sheet: &SheetSelector) -> Result<()> {
    if let SheetSelector::Named(name) = sheet {
        bail!(
            "{} holds a single table; sheet '{name}' cannot be selected",
            path.display()
        );
    }
    Ok(())
}

/// Turn row-major records into a dataset, keeping columns in first-seen order.
fn from_rows(names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Dataset> {
    let mut columns: Vec<Column> = names
        .into_iter()
        .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
        .collect();
    for row in rows {
        for (col, cell) in columns.iter_mut().zip(row) {
            col.cells.push(cell);
        }
    }
    Ok(Dataset::new(columns)?)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path, sheet: &SheetSelector) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let name = match sheet {
        SheetSelector::Named(name) => name.clone(),
        SheetSelector::Default => {
            let first = workbook
                .sheet_names()
                .first()
                .cloned()
                .context("workbook has no sheets")?;
            log::debug!("Using first sheet '{first}'");
            first
        }
    };
    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("reading sheet '{name}'"))?;
    range_to_dataset(&range).with_context(|| format!("sheet '{name}'"))
}

/// Every sheet of a workbook, in workbook order.
pub(crate) fn load_workbook_sheets(path: &Path) -> Result<Vec<(String, Dataset)>> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("reading sheet '{name}'"))?;
        let dataset = range_to_dataset(&range).with_context(|| format!("sheet '{name}'"))?;
        sheets.push((name, dataset));
    }
    Ok(sheets)
}

/// First row of the used range holds the column names. Rows below it with
/// no value at all past the last filled row are not part of the range.
fn range_to_dataset(range: &Range<Data>) -> Result<Dataset> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Dataset::default());
    };
    let names = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match data_to_cell(cell) {
            CellValue::Null => format!("Unnamed: {i}"),
            other => other.to_string(),
        })
        .collect();
    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();
    from_rows(names, rows)
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        // Serial day number, as the spreadsheet stores it.
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        // Formula errors (#DIV/0!, #N/A) carry no measurement.
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema, either records-oriented
/// (`df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "time": 0, "site": "A", "chlorophyll": 0.42 },
///   ...
/// ]
/// ```
///
/// or a workbook mapping sheet names to such record arrays.
fn load_json(path: &Path, sheet: &SheetSelector) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = match (&root, sheet) {
        (JsonValue::Array(records), SheetSelector::Default) => records,
        (JsonValue::Array(_), SheetSelector::Named(name)) => {
            bail!("file holds a single table; sheet '{name}' cannot be selected")
        }
        (JsonValue::Object(sheets), SheetSelector::Default) => {
            let (name, records) = sheets.iter().next().context("workbook has no sheets")?;
            log::debug!("Using first sheet '{name}'");
            records
                .as_array()
                .with_context(|| format!("sheet '{name}' is not an array of records"))?
        }
        (JsonValue::Object(sheets), SheetSelector::Named(name)) => sheets
            .get(name)
            .with_context(|| format!("sheet '{name}' not found"))?
            .as_array()
            .with_context(|| format!("sheet '{name}' is not an array of records"))?,
        _ => bail!("Expected a JSON array of records or an object of sheets"),
    };

    records_to_dataset(records)
}

pub(crate) fn records_to_dataset(records: &[JsonValue]) -> Result<Dataset> {
    let mut names: Vec<String> = Vec::new();
    let mut objects: Vec<&Map<String, JsonValue>> = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            names
                .iter()
                .map(|name| obj.get(name).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    from_rows(names, rows)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per observation.
/// Empty fields are missing values; numbers and booleans are inferred.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields but the header has {}",
                record.len(),
                headers.len()
            );
        }
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    from_rows(headers, rows)
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table.
///
/// Numeric, boolean and string columns map onto the matching cell types;
/// anything else (timestamps, dates, decimals) is kept as its text rendering.
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Column> = names
        .iter()
        .map(|name| Column::new(name.clone(), Vec::new()))
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                let cell = extract_cell(array, row)
                    .with_context(|| format!("column '{}', row {row}", column.name))?;
                column.cells.push(cell);
            }
        }
    }

    Ok(Dataset::new(columns)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Float64 => CellValue::Float(downcast::<Float64Array>(any)?.value(row)),
        DataType::Float32 => CellValue::Float(downcast::<Float32Array>(any)?.value(row) as f64),
        DataType::Int64 => CellValue::Integer(downcast::<Int64Array>(any)?.value(row)),
        DataType::Int32 => CellValue::Integer(downcast::<Int32Array>(any)?.value(row) as i64),
        DataType::Boolean => CellValue::Bool(downcast::<BooleanArray>(any)?.value(row)),
        DataType::Utf8 => CellValue::String(downcast::<StringArray>(any)?.value(row).to_string()),
        DataType::LargeUtf8 => {
            CellValue::String(downcast::<LargeStringArray>(any)?.value(row).to_string())
        }
        _ => CellValue::String(
            arrow::util::display::array_value_to_string(col, row)
                .context("rendering cell as text")?,
        ),
    };
    Ok(cell)
}

fn downcast<T: 'static>(any: &dyn std::any::Any) -> Result<&T> {
    any.downcast_ref::<T>()
        .with_context(|| format!("expected {}", std::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_cell_type() {
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type("12"), CellValue::Integer(12));
        assert_eq!(guess_cell_type("1.5"), CellValue::Float(1.5));
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(
            guess_cell_type("2019-03-01"),
            CellValue::String("2019-03-01".into())
        );
    }

    #[test]
    fn test_records_fill_absent_keys_with_null() {
        let records: Vec<JsonValue> =
            serde_json::from_str(r#"[{"a": 1, "b": 2.5}, {"a": 3, "c": "x"}]"#).unwrap();
        let ds = records_to_dataset(&records).unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b", "c"]);
        assert_eq!(ds.sequence("b").unwrap(), vec![Some(2.5), None]);
        assert_eq!(ds.column("c").unwrap().cells[0], CellValue::Null);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_dataset(Path::new("data.txt"), &SheetSelector::Default).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn test_spreadsheet_cells() {
        assert_eq!(data_to_cell(&Data::Float(0.5)), CellValue::Float(0.5));
        assert_eq!(data_to_cell(&Data::Int(3)), CellValue::Integer(3));
        assert_eq!(data_to_cell(&Data::Empty), CellValue::Null);
        assert_eq!(data_to_cell(&Data::String(String::new())), CellValue::Null);
        assert_eq!(
            data_to_cell(&Data::String("SONDE_01".into())),
            CellValue::String("SONDE_01".into())
        );
    }

    #[test]
    fn test_named_sheet_on_single_table_format() {
        let err = load_dataset(
            Path::new("data.csv"),
            &SheetSelector::Named("GENERAL".into()),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("single table"));
    }
}

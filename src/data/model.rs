use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Sample / Sequence – the numeric view of a column
// ---------------------------------------------------------------------------

/// One measurement. `None` is the missing marker.
pub type Sample = Option<f64>;

/// An ordered run of samples; position is the only identity.
pub type Sequence = Vec<Sample>;

/// Number of non-missing samples.
pub fn count_present(values: &[Sample]) -> usize {
    values.iter().filter(|v| v.is_some()).count()
}

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell mirroring the common spreadsheet types.
/// Section groupings key a `BTreeMap` on it, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can key BTreeMaps on CellValue --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a measurement.
    ///
    /// `Ok(None)` for empty cells and non-finite floats, `Err(())` for cells
    /// that are not numbers at all.
    fn as_sample(&self) -> std::result::Result<Sample, ()> {
        match self {
            CellValue::Float(v) if !v.is_finite() => Ok(None),
            CellValue::Float(v) => Ok(Some(*v)),
            CellValue::Integer(i) => Ok(Some(*i as f64)),
            CellValue::Null => Ok(None),
            CellValue::String(_) | CellValue::Bool(_) => Err(()),
        }
    }
}

impl From<Sample> for CellValue {
    fn from(sample: Sample) -> Self {
        match sample {
            Some(v) => CellValue::Float(v),
            None => CellValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Dataset
// ---------------------------------------------------------------------------

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            cells,
        }
    }

    /// Build a numeric column from samples.
    pub fn from_samples(name: impl Into<String>, values: &[Sample]) -> Self {
        Column::new(name, values.iter().map(|&v| CellValue::from(v)).collect())
    }

    /// Numeric view of the column. Fails on the first non-numeric cell.
    pub fn to_sequence(&self) -> Result<Sequence> {
        self.cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.as_sample().map_err(|_| SieveError::NonNumericCell {
                    column: self.name.clone(),
                    row,
                    value: cell.to_string(),
                })
            })
            .collect()
    }

    /// Whether every cell can be read as a sample.
    pub fn is_numeric(&self) -> bool {
        self.cells.iter().all(|c| c.as_sample().is_ok())
    }
}

/// A table of equally long, positionally aligned columns.
///
/// Cloning a `Dataset` is always a deep copy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Assemble a dataset, checking that names are unique and that all
    /// columns share the length of the first one.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(SieveError::DuplicateColumn(col.name.clone()));
            }
            if col.cells.len() != rows {
                return Err(SieveError::LengthMismatch {
                    column: col.name.clone(),
                    expected: rows,
                    found: col.cells.len(),
                });
            }
        }
        Ok(Dataset { columns, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of the columns that can be filtered.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Numeric view of the named column.
    pub fn sequence(&self, name: &str) -> Result<Sequence> {
        self.column(name)
            .ok_or_else(|| SieveError::UnknownColumn(name.to_string()))?
            .to_sequence()
    }

    /// Overwrite every cell of the named column with `values`.
    pub fn replace_sequence(&mut self, name: &str, values: &[Sample]) -> Result<()> {
        let rows = self.rows;
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| SieveError::UnknownColumn(name.to_string()))?;
        if values.len() != rows {
            return Err(SieveError::LengthMismatch {
                column: name.to_string(),
                expected: rows,
                found: values.len(),
            });
        }
        col.cells = values.iter().map(|&v| CellValue::from(v)).collect();
        Ok(())
    }

    /// Group row indices by the value each row holds in column `by`.
    pub fn group_rows(&self, by: &str) -> Result<BTreeMap<CellValue, Vec<usize>>> {
        let col = self
            .column(by)
            .ok_or_else(|| SieveError::UnknownColumn(by.to_string()))?;
        let mut groups: BTreeMap<CellValue, Vec<usize>> = BTreeMap::new();
        for (row, cell) in col.cells.iter().enumerate() {
            groups.entry(cell.clone()).or_default().push(row);
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "site",
                vec![
                    CellValue::String("A".into()),
                    CellValue::String("B".into()),
                    CellValue::String("A".into()),
                ],
            ),
            Column::new(
                "temperature",
                vec![
                    CellValue::Float(21.5),
                    CellValue::Null,
                    CellValue::Integer(22),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_sequence_maps_null_and_integers() {
        let ds = sample_dataset();
        assert_eq!(
            ds.sequence("temperature").unwrap(),
            vec![Some(21.5), None, Some(22.0)]
        );
    }

    #[test]
    fn test_non_finite_cells_are_missing() {
        let col = Column::new(
            "x",
            vec![
                CellValue::Float(f64::NAN),
                CellValue::Float(1.0),
                CellValue::Float(f64::INFINITY),
                CellValue::Float(f64::NEG_INFINITY),
            ],
        );
        assert_eq!(col.to_sequence().unwrap(), vec![None, Some(1.0), None, None]);
        assert!(col.is_numeric());
    }

    #[test]
    fn test_non_numeric_column_is_rejected() {
        let ds = sample_dataset();
        let err = ds.sequence("site").unwrap_err();
        assert!(matches!(err, SieveError::NonNumericCell { row: 0, .. }));
        assert_eq!(ds.numeric_column_names(), vec!["temperature".to_string()]);
    }

    #[test]
    fn test_unknown_column() {
        let ds = sample_dataset();
        assert_eq!(
            ds.sequence("salinity").unwrap_err(),
            SieveError::UnknownColumn("salinity".into())
        );
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = Dataset::new(vec![
            Column::from_samples("a", &[Some(1.0), Some(2.0)]),
            Column::from_samples("b", &[Some(1.0)]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SieveError::LengthMismatch {
                column: "b".into(),
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let err = Dataset::new(vec![
            Column::from_samples("a", &[Some(1.0)]),
            Column::from_samples("a", &[Some(2.0)]),
        ])
        .unwrap_err();
        assert_eq!(err, SieveError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_replace_sequence_checks_length() {
        let mut ds = sample_dataset();
        assert!(ds.replace_sequence("temperature", &[Some(1.0)]).is_err());
        ds.replace_sequence("temperature", &[None, Some(2.0), Some(3.0)])
            .unwrap();
        assert_eq!(
            ds.column("temperature").unwrap().cells,
            vec![CellValue::Null, CellValue::Float(2.0), CellValue::Float(3.0)]
        );
    }

    #[test]
    fn test_group_rows_by_section() {
        let ds = sample_dataset();
        let groups = ds.group_rows("site").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&CellValue::String("A".into())], vec![0, 2]);
        assert_eq!(groups[&CellValue::String("B".into())], vec![1]);
    }
}

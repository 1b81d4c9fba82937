//! Tabular payload shared by table, graph, heatmap and widget items.
//!
//! A [`DataTable`] is an index column (a name plus one label per row) followed
//! by ordered, named data columns. Cells are typed loosely: numbers, text, or
//! empty. Tables can be built in memory or loaded from delimited text where
//! the first column is the index.
//!
//! # Example
//!
//! ```rust
//! use report_render::table::DataTable;
//!
//! let mut table = DataTable::new("date", ["aapl", "goog"]);
//! table.push_row("2024-01-02", [185.6, 139.6]).unwrap();
//! table.push_row("2024-01-03", [184.3, 140.4]).unwrap();
//!
//! assert_eq!(table.row_count(), 2);
//! assert_eq!(table.columns(), ["aapl", "goog"]);
//! ```

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{ReportError, Result};

/// One table cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    /// Numeric value
    Number(f64),
    /// Anything that did not parse as a number
    Text(String),
    /// Missing value
    Empty,
}

impl Cell {
    /// Parse a raw field: blank is [`Cell::Empty`], numeric is [`Cell::Number`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => Cell::Number(value),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    /// Numeric value, if this cell holds a non-NaN number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(value) if !value.is_nan() => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(value) if value.is_nan() => Ok(()),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Text(text) => f.write_str(text),
            Cell::Empty => Ok(()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Number(value) if value.is_finite() => serializer.serialize_f64(*value),
            Cell::Number(_) | Cell::Empty => serializer.serialize_unit(),
            Cell::Text(text) => serializer.serialize_str(text),
        }
    }
}

// Agrees with the `Serialize` impl: non-finite numbers become null.
impl From<&Cell> for Value {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Number(value) if value.is_finite() => Value::from(*value),
            Cell::Number(_) | Cell::Empty => Value::Null,
            Cell::Text(text) => Value::String(text.clone()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}

/// Index column plus named data columns, stored row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    index_name: String,
    columns: Vec<String>,
    index: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl DataTable {
    /// Empty table with the given index name and data columns.
    pub fn new<I, S>(index_name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index_name: index_name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Fails with [`ReportError::RaggedRow`] unless there is one
    /// cell per column.
    pub fn push_row<I, C>(&mut self, label: impl Into<String>, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        let label = label.into();
        let cells: Vec<Cell> = cells.into_iter().map(Into::into).collect();
        if cells.len() != self.columns.len() {
            return Err(ReportError::RaggedRow {
                label,
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        self.index.push(label);
        self.rows.push(cells);
        Ok(())
    }

    /// Load delimited text from a file. The first column becomes the index.
    pub fn from_csv(path: impl AsRef<Path>, sep: u8) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ReportError::MissingSource(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, sep)
    }

    /// Load delimited text from any reader. The first column becomes the index.
    pub fn from_reader<R: Read>(reader: R, sep: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(sep)
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut fields = headers.iter();
        let index_name = fields.next().unwrap_or_default().to_string();
        let mut table = DataTable::new(index_name, fields);

        for record in csv_reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let label = fields.next().unwrap_or_default();
            table.push_row(label, fields.map(Cell::parse))?;
        }
        Ok(table)
    }

    /// Name of the index column (may be empty).
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Index labels, one per row.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Data column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cells, row-major.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of data columns (the index is not counted).
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of one data column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Iterate `(index_label, cells)` pairs.
    pub fn iter_rows(&self) -> impl Iterator<Item = (&str, &[Cell])> + '_ {
        self.index
            .iter()
            .zip(&self.rows)
            .map(|(label, row)| (label.as_str(), row.as_slice()))
    }

    /// Row-wise sums; missing and non-numeric cells count as zero.
    pub fn row_totals(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.iter().filter_map(Cell::as_f64).sum())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn parses_cells() {
        assert_eq!(Cell::parse("1.5"), Cell::Number(1.5));
        assert_eq!(Cell::parse(" -3 "), Cell::Number(-3.0));
        assert_eq!(Cell::parse(""), Cell::Empty);
        assert_eq!(Cell::parse("n/a"), Cell::Text("n/a".into()));
    }

    #[test]
    fn reads_csv_with_index_column() {
        let data = "date,aapl,goog\n2024-01-02,185.6,139.6\n2024-01-03,,140.4\n";
        let table = DataTable::from_reader(data.as_bytes(), b',').expect("parse");

        assert_eq!(table.index_name(), "date");
        assert_eq!(table.columns(), ["aapl", "goog"]);
        assert_eq!(table.index(), ["2024-01-02", "2024-01-03"]);
        assert_eq!(table.rows()[1][0], Cell::Empty);
        assert_eq!(table.rows()[1][1], Cell::Number(140.4));
    }

    #[test]
    fn reads_csv_with_custom_separator() {
        let data = "k;a;b\nx;1;2\n";
        let table = DataTable::from_reader(data.as_bytes(), b';').expect("parse");
        assert_eq!(table.columns(), ["a", "b"]);
        assert_eq!(table.row_totals(), vec![3.0]);
    }

    #[test]
    fn from_csv_requires_existing_file() {
        let temp = TempDir::new().expect("temp dir");
        let missing = temp.path().join("missing.csv");
        let err = DataTable::from_csv(&missing, b',').unwrap_err();
        assert!(matches!(err, ReportError::MissingSource(p) if p == missing));
    }

    #[test]
    fn from_csv_reads_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("t.csv");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, ",a\nr1,4\nr2,5").expect("write");

        let table = DataTable::from_csv(&path, b',').expect("load");
        assert_eq!(table.index_name(), "");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column(0).cloned().collect::<Vec<_>>(), vec![Cell::Number(4.0), Cell::Number(5.0)]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut table = DataTable::new("i", ["a", "b"]);
        let err = table.push_row("r", [1.0]).unwrap_err();
        assert!(matches!(err, ReportError::RaggedRow { expected: 2, found: 1, .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn row_totals_skip_missing_values() {
        let mut table = DataTable::new("i", ["a", "b", "c"]);
        table.push_row("r1", [Cell::Number(1.0), Cell::Empty, Cell::Number(-4.0)]).unwrap();
        table.push_row("r2", [Cell::Number(f64::NAN), Cell::from("x"), Cell::Number(2.5)]).unwrap();
        assert_eq!(table.row_totals(), vec![-3.0, 2.5]);
    }

    #[test]
    fn serializes_cells_as_json_scalars() {
        let cells = vec![Cell::Number(1.5), Cell::Text("a".into()), Cell::Empty, Cell::Number(f64::NAN)];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[1.5,"a",null,null]"#);
    }
}

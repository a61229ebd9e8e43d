//! Owned tabular data as read from CSV extracts.
//!
//! Every cell starts life as text; value normalization may later retype
//! individual flag cells to booleans, so a column can legitimately hold a
//! mix of the two.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("content has no header row")]
    MissingHeader,
    #[error("failed to serialize table: {0}")]
    Serialize(String),
}

/// A single cell. Flag cells that matched the yes/no vocabulary become
/// `Bool`; everything else stays `Text`, including unrecognized flag values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Bool(_) => None,
        }
    }

    /// The CSV serialization of the cell. Also the representation keys are
    /// compared under during merge.
    pub fn render(&self) -> &str {
        match self {
            Value::Text(text) => text,
            Value::Bool(true) => "True",
            Value::Bool(false) => "False",
        }
    }
}

/// An ordered sequence of rows sharing one column set.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::text(""));
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns), matching how the run outcome reports shapes.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Parse CSV text into a table of text cells. Ragged rows are padded or
    /// truncated to the header width rather than rejected; upstream extracts
    /// occasionally carry trailing-comma damage.
    pub fn from_csv(content: &str) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.to_string())
            .collect();
        if columns.is_empty() || (columns.len() == 1 && columns[0].is_empty()) {
            return Err(TableError::MissingHeader);
        }

        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record?;
            let row: Vec<Value> = record.iter().map(Value::text).collect();
            table.push_row(row);
        }

        Ok(table)
    }

    /// Serialize to CSV. Booleans render as `True`/`False` so a republished
    /// master round-trips the way the original extracts did.
    pub fn to_csv(&self) -> Result<String, TableError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Value::render))?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|err| TableError::Serialize(err.to_string()))?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_rows_as_text() {
        let table = Table::from_csv("a,b,c\n1,2,3\n4,5,6\n").unwrap();
        assert_eq!(table.columns(), ["a", "b", "c"]);
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.rows()[0][1], Value::text("2"));
    }

    #[test]
    fn parses_quoted_header_with_embedded_newline() {
        let table = Table::from_csv("\"Container\nNumber\",b\nx,y\n").unwrap();
        assert_eq!(table.columns()[0], "Container\nNumber");
        assert_eq!(table.rows()[0][0], Value::text("x"));
    }

    #[test]
    fn pads_short_rows_to_header_width() {
        let table = Table::from_csv("a,b,c\n1,2\n").unwrap();
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.rows()[0][2], Value::text(""));
    }

    #[test]
    fn empty_content_is_missing_header() {
        assert!(matches!(Table::from_csv(""), Err(TableError::MissingHeader)));
    }

    #[test]
    fn header_only_content_is_an_empty_table() {
        let table = Table::from_csv("a,b\n").unwrap();
        assert_eq!(table.shape(), (0, 2));
    }

    #[test]
    fn booleans_serialize_as_python_style_literals() {
        let mut table = Table::new(vec!["k".into(), "flag".into()]);
        table.push_row(vec![Value::text("1"), Value::Bool(true)]);
        table.push_row(vec![Value::text("2"), Value::Bool(false)]);

        let csv = table.to_csv().unwrap();
        assert_eq!(csv, "k,flag\n1,True\n2,False\n");
    }

    #[test]
    fn csv_round_trip_preserves_text_cells() {
        let input = "a,b\nhello,\"with,comma\"\n,\n";
        let table = Table::from_csv(input).unwrap();
        let output = table.to_csv().unwrap();
        let reparsed = Table::from_csv(&output).unwrap();
        assert_eq!(table, reparsed);
    }
}

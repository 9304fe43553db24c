//! Tabular loader: decodes uploaded CSV bytes into row-addressable tables.
//!
//! The loader is deliberately permissive about row shape (short rows read as
//! empty fields) and strict about everything a human can get wrong at the
//! file level: a non-`.csv` name or undecodable content is rejected with an
//! error naming the offending file. Row numbers are reported the way a
//! spreadsheet shows them: the header is row 1, the first data row is row 2.

use crate::errors::ServiceError;

/// An ordered table of string fields keyed by header name.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// The declared upload file name, e.g. `products.csv`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows (header excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Required column names absent from the header, sorted.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        let mut missing: Vec<String> = required
            .iter()
            .filter(|r| !self.headers.iter().any(|h| h == *r))
            .map(|r| r.to_string())
            .collect();
        missing.sort_unstable();
        missing
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        (0..self.rows.len()).map(move |index| TableRow { table: self, index })
    }
}

/// One data row, addressable by header name.
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    table: &'a RawTable,
    index: usize,
}

impl TableRow<'_> {
    /// 1-based position in the source file, counting the header row.
    pub fn csv_row(&self) -> u32 {
        self.index as u32 + 2
    }

    /// Field value by column name; empty when the column is missing or the
    /// row is shorter than the header.
    pub fn field(&self, name: &str) -> &str {
        self.table
            .headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| self.table.rows[self.index].get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Parses uploaded bytes into a [`RawTable`].
///
/// Header cells are trimmed; data cells are kept verbatim (field rules decide
/// how much whitespace matters per field).
pub fn load_table(declared_name: &str, bytes: &[u8]) -> Result<RawTable, ServiceError> {
    if !declared_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(ServiceError::InvalidInput(format!(
            "{} must be a CSV",
            declared_name
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| {
            ServiceError::InvalidInput(format!("{}: could not read CSV: {}", declared_name, e))
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            ServiceError::InvalidInput(format!("{}: could not read CSV: {}", declared_name, e))
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable {
        name: declared_name.to_string(),
        headers,
        rows,
    })
}

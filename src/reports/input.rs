use crate::Result;
use camino::Utf8Path;
use csv::{ByteRecord, ReaderBuilder};
use ohno::{EnrichableExt, IntoAppError, bail};
use std::fs::File;
use std::io::Read;

/// Column holding a row's repository address.
pub const URL_COLUMN: &str = "html_url";

/// An input table held in memory, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    url_column: usize,
}

impl InputTable {
    /// Read a table from a file.
    pub fn load(path: &Utf8Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).into_app_err_with(|| format!("opening input file '{path}'"))?;
        Self::read(file, delimiter).map_err(|e| e.enrich_with(|| format!("reading input file '{path}'")))
    }

    /// Read a table with a header row that includes [`URL_COLUMN`].
    ///
    /// Rows may be ragged; missing cells read as empty strings.
    pub fn read(reader: impl Read, delimiter: u8) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().delimiter(delimiter).flexible(true).from_reader(reader);

        let headers: Vec<String> = csv_reader.byte_headers()?.iter().map(decode).collect();
        let Some(url_column) = headers.iter().position(|h| h.trim() == URL_COLUMN) else {
            bail!("no '{URL_COLUMN}' column in the input header");
        };

        let mut rows = Vec::new();
        let mut record = ByteRecord::new();
        while csv_reader.read_byte_record(&mut record)? {
            rows.push(record.iter().map(decode).collect());
        }

        Ok(Self { headers, rows, url_column })
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by header name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cell contents, or an empty string when the row is too short.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows.get(row).and_then(|r| r.get(column)).map_or("", String::as_str)
    }

    /// Repository address of every row, trimmed, in file order.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        (0..self.rows.len()).map(|row| self.value(row, self.url_column).trim()).collect()
    }

    /// Cells of one row, padded to the header width.
    pub(crate) fn row_cells(&self, row: usize) -> impl Iterator<Item = &str> {
        (0..self.headers.len()).map(move |column| self.value(row, column))
    }
}

fn decode(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

//! Raw reference table read from CSV or from the first sheet of a workbook.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use csv::ReaderBuilder;
use ratatosk_model::ConfigError;

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Marker the reference workbooks use for an empty dependency or note.
const NONE_SENTINEL: &str = "None";

/// Header row plus one map per data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    pub headers: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

impl ReferenceTable {
    /// Reads a `.csv` reference or the first sheet of a spreadsheet.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if extension == "csv" {
            let file = std::fs::File::open(path).map_err(|e| ConfigError::io(path, e))?;
            return Self::from_reader(file, path);
        }
        if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
            return Self::from_workbook(path);
        }
        Err(ConfigError::NotATable {
            path: path.to_path_buf(),
        })
    }

    /// Reads CSV text from any reader; `path` only labels errors.
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self, ConfigError> {
        let csv_error = |e: csv::Error| ConfigError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(clean_header)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(keyed_row(&headers, record.iter()));
        }
        Ok(Self { headers, rows })
    }

    /// First worksheet, first row as header. Blank rows are dropped.
    pub fn from_workbook(path: &Path) -> Result<Self, ConfigError> {
        let spreadsheet_error = |message: String| ConfigError::Spreadsheet {
            path: path.to_path_buf(),
            message,
        };
        let mut workbook =
            open_workbook_auto(path).map_err(|e| spreadsheet_error(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| spreadsheet_error("workbook has no sheets".to_string()))?
            .map_err(|e| spreadsheet_error(e.to_string()))?;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = sheet_rows
            .next()
            .map(|row| row.iter().map(|cell| clean_header(&cell_text(cell))).collect())
            .unwrap_or_default();
        let rows = sheet_rows
            .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
            .map(|row| {
                let cells: Vec<String> = row.iter().map(cell_text).collect();
                keyed_row(&headers, cells.iter().map(String::as_str))
            })
            .collect();
        Ok(Self { headers, rows })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

fn clean_header(header: &str) -> String {
    header.trim_matches('\u{feff}').trim().to_string()
}

fn keyed_row<'a>(
    headers: &[String],
    values: impl Iterator<Item = &'a str>,
) -> BTreeMap<String, String> {
    headers
        .iter()
        .zip(values)
        .map(|(key, value)| (key.clone(), value.trim().to_string()))
        .collect()
}

/// Cell text as the workbook shows it; whole floats lose their `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{value:.0}")
        }
        other => other.to_string(),
    }
}

/// Non-blank cell value, taken as written.
pub(crate) fn field<'a>(row: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    row.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Like [`field`], but the `None` marker also counts as blank. Only used for
/// dependency and note columns; targets keep `None` as a literal.
pub(crate) fn optional_field<'a>(row: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    field(row, key).filter(|v| *v != NONE_SENTINEL)
}

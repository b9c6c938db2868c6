//! CSV Source - Reads one input file into trimmed headers and typed rows

use crate::db::store::SqlType;
use crate::error::{LoadError, Result};
use crate::ingestion::table_builder::column_type;
use crate::ingestion::value::CellValue;
use csv::ReaderBuilder;
use std::io::Read;
use std::path::{Path, PathBuf};

/// A parsed CSV file: trimmed header names plus one row of cells per record.
#[derive(Clone, Debug)]
pub struct CsvFrame {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl CsvFrame {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Base name of the source path, independent of directory
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// CSV Source - Wraps a file path and converts its records into cells.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<CsvFrame> {
        let file = std::fs::File::open(&self.path).map_err(|e| LoadError::Csv {
            file: self.path.display().to_string(),
            message: format!("Failed to open file: {}", e),
        })?;
        self.read_from(file)
    }

    /// Cells are typed by their column's `TYPE_RULES` entry. Short records are
    /// padded with missing values; long records are rejected.
    pub fn read_from<R: Read>(&self, reader: R) -> Result<CsvFrame> {
        let file = self.path.display().to_string();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| LoadError::Csv {
                file: file.clone(),
                message: format!("Failed to read CSV headers: {}", e),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();
        let types: Vec<SqlType> = headers.iter().map(|h| column_type(h)).collect();

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| LoadError::Csv {
                file: file.clone(),
                message: format!("Failed to read CSV record: {}", e),
            })?;

            if record.len() > headers.len() {
                return Err(LoadError::MalformedRow {
                    file,
                    row: idx + 1,
                    expected: headers.len(),
                    found: record.len(),
                });
            }

            let row = types
                .iter()
                .enumerate()
                .map(|(i, sql_type)| CellValue::parse_as(record.get(i).unwrap_or(""), *sql_type))
                .collect();
            rows.push(row);
        }

        Ok(CsvFrame {
            path: self.path.clone(),
            headers,
            rows,
        })
    }
}

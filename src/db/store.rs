//! Table Store - The backing-store seam the ingestion pipeline writes through

use crate::error::{LoadError, Result};
use crate::ingestion::value::CellValue;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref TABLE_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Column types the loader ever declares
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    VarChar(u32),
    Integer,
    Float,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::VarChar(len) => write!(f, "VARCHAR({})", len),
            SqlType::Integer => write!(f, "INTEGER"),
            SqlType::Float => write!(f, "FLOAT"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: SqlType,
    /// Autoincrementing integer primary key
    pub primary_key: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
        }
    }

    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: SqlType::Integer,
            primary_key: true,
        }
    }
}

/// A column as reported back by the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub declared_type: String,
    pub primary_key: bool,
}

/// Blocking table operations against one exclusively-held connection.
///
/// `append_rows` and `replace_table` must be atomic per call: either every
/// row lands or none do.
pub trait TableStore {
    fn table_exists(&self, table: &str) -> Result<bool>;

    fn create_table(&mut self, table: &str, columns: &[ColumnDefinition]) -> Result<()>;

    fn drop_table(&mut self, table: &str) -> Result<()>;

    /// Insert-only. `columns` names the target column of each cell position.
    fn append_rows(&mut self, table: &str, columns: &[String], rows: &[Vec<CellValue>]) -> Result<usize>;

    /// Drop, recreate and fill `table` in one step.
    fn replace_table(
        &mut self,
        table: &str,
        columns: &[ColumnDefinition],
        rows: &[Vec<CellValue>],
    ) -> Result<()>;

    fn row_count(&self, table: &str) -> Result<u64>;

    fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescription>>;
}

pub fn validate_table_name(table: &str) -> Result<()> {
    if TABLE_NAME.is_match(table) {
        Ok(())
    } else {
        Err(LoadError::InvalidIdentifier(format!(
            "'{}' is not a valid table name (letters, digits and underscores, not starting with a digit)",
            table
        )))
    }
}

/// Every name must be valid and no two may collide. SQLite table names are
/// case-insensitive, so `Dataset` and `dataset` collide.
pub fn validate_distinct_tables(names: &[&str]) -> Result<()> {
    for (i, name) in names.iter().enumerate() {
        validate_table_name(name)?;
        if names[i + 1..].iter().any(|other| name.eq_ignore_ascii_case(other)) {
            return Err(LoadError::Config(format!("table name '{}' is used twice", name)));
        }
    }
    Ok(())
}

/// Double-quote an identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

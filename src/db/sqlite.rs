//! SQLite-backed table store

use crate::db::store::{quote_ident, validate_table_name, ColumnDefinition, ColumnDescription, TableStore};
use crate::error::{LoadError, Result};
use crate::ingestion::value::CellValue;
use itertools::Itertools;
use rusqlite::{params, params_from_iter, Connection, Transaction};
use std::path::Path;
use tracing::debug;

pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| LoadError::ConnectionFailure(format!("Failed to open database {}: {}", path.display(), e)))?;

        Ok(Self {
            conn,
            location: path.display().to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LoadError::ConnectionFailure(format!("Failed to open in-memory database: {}", e)))?;

        Ok(Self {
            conn,
            location: ":memory:".to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Raw connection, for ad-hoc reads
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn create_table_sql(table: &str, columns: &[ColumnDefinition]) -> String {
        let defs = columns
            .iter()
            .map(|col| {
                if col.primary_key {
                    format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote_ident(&col.name))
                } else {
                    format!("{} {}", quote_ident(&col.name), col.sql_type)
                }
            })
            .join(", ");
        format!("CREATE TABLE {} ({})", quote_ident(table), defs)
    }

    fn insert_sql(table: &str, columns: &[String]) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.iter().map(|c| quote_ident(c)).join(", "),
            (1..=columns.len()).map(|i| format!("?{}", i)).join(", ")
        )
    }

    fn insert_all(tx: &Transaction<'_>, sql: &str, table: &str, rows: &[Vec<CellValue>]) -> Result<usize> {
        let mut stmt = tx
            .prepare(sql)
            .map_err(|e| LoadError::WriteFailure(format!("Failed to prepare insert into {}: {}", table, e)))?;

        for (idx, row) in rows.iter().enumerate() {
            stmt.execute(params_from_iter(row.iter())).map_err(|e| {
                LoadError::WriteFailure(format!("Failed to insert row {} into {}: {}", idx + 1, table, e))
            })?;
        }

        Ok(rows.len())
    }
}

impl TableStore for SqliteStore {
    fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                params![table],
                |row| row.get(0),
            )
            .map_err(|e| LoadError::ConnectionFailure(format!("Failed to inspect tables: {}", e)))?;
        Ok(count > 0)
    }

    fn create_table(&mut self, table: &str, columns: &[ColumnDefinition]) -> Result<()> {
        validate_table_name(table)?;
        let sql = Self::create_table_sql(table, columns);
        debug!("{}", sql);
        self.conn
            .execute(&sql, [])
            .map_err(|e| LoadError::WriteFailure(format!("Failed to create table {}: {}", table, e)))?;
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        validate_table_name(table)?;
        self.conn
            .execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])
            .map_err(|e| LoadError::WriteFailure(format!("Failed to drop table {}: {}", table, e)))?;
        Ok(())
    }

    fn append_rows(&mut self, table: &str, columns: &[String], rows: &[Vec<CellValue>]) -> Result<usize> {
        validate_table_name(table)?;
        let sql = Self::insert_sql(table, columns);

        let tx = self
            .conn
            .transaction()
            .map_err(|e| LoadError::WriteFailure(format!("Failed to start transaction: {}", e)))?;
        let written = Self::insert_all(&tx, &sql, table, rows)?;
        tx.commit()
            .map_err(|e| LoadError::WriteFailure(format!("Failed to commit rows into {}: {}", table, e)))?;

        Ok(written)
    }

    fn replace_table(
        &mut self,
        table: &str,
        columns: &[ColumnDefinition],
        rows: &[Vec<CellValue>],
    ) -> Result<()> {
        validate_table_name(table)?;
        let create = Self::create_table_sql(table, columns);
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let insert = Self::insert_sql(table, &names);

        let tx = self
            .conn
            .transaction()
            .map_err(|e| LoadError::WriteFailure(format!("Failed to start transaction: {}", e)))?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])
            .map_err(|e| LoadError::WriteFailure(format!("Failed to drop table {}: {}", table, e)))?;
        tx.execute(&create, [])
            .map_err(|e| LoadError::WriteFailure(format!("Failed to create table {}: {}", table, e)))?;
        Self::insert_all(&tx, &insert, table, rows)?;
        tx.commit()
            .map_err(|e| LoadError::WriteFailure(format!("Failed to commit table {}: {}", table, e)))?;

        Ok(())
    }

    fn row_count(&self, table: &str) -> Result<u64> {
        validate_table_name(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)), [], |row| row.get(0))
            .map_err(|e| LoadError::ConnectionFailure(format!("Failed to count rows in {}: {}", table, e)))?;
        Ok(count as u64)
    }

    fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescription>> {
        validate_table_name(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))
            .map_err(|e| LoadError::ConnectionFailure(format!("Failed to describe {}: {}", table, e)))?;

        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnDescription {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                    primary_key: row.get::<_, i64>(5)? > 0,
                })
            })
            .map_err(|e| LoadError::ConnectionFailure(format!("Failed to describe {}: {}", table, e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| LoadError::ConnectionFailure(format!("Failed to read columns of {}: {}", table, e)))?;

        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::SqlType;

    fn columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::primary_key("id"),
            ColumnDefinition::new("Flow Duration", SqlType::Float),
            ColumnDefinition::new("source", SqlType::VarChar(255)),
        ]
    }

    #[test]
    fn test_create_append_count() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.table_exists("flows").unwrap());

        store.create_table("flows", &columns()).unwrap();
        assert!(store.table_exists("flows").unwrap());

        let written = store
            .append_rows(
                "flows",
                &["Flow Duration".to_string(), "source".to_string()],
                &[
                    vec![CellValue::Float(1.5), CellValue::Text("1".into())],
                    vec![CellValue::Float(2.5), CellValue::Text("1".into())],
                ],
            )
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.row_count("flows").unwrap(), 2);

        let ids: Vec<i64> = store
            .connection()
            .prepare("SELECT id FROM flows ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_table_exists_ignores_case() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.create_table("Flows", &columns()).unwrap();
        assert!(store.table_exists("flows").unwrap());
        assert!(store.table_exists("FLOWS").unwrap());
    }

    #[test]
    fn test_failed_append_writes_nothing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.create_table("flows", &columns()).unwrap();

        let err = store
            .append_rows(
                "flows",
                &["Flow Duration".to_string(), "no_such_column".to_string()],
                &[vec![CellValue::Float(1.0), CellValue::Text("1".into())]],
            )
            .unwrap_err();
        assert!(matches!(err, LoadError::WriteFailure(_)));
        assert_eq!(store.row_count("flows").unwrap(), 0);
    }

    #[test]
    fn test_replace_table_discards_old_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let cols = vec![
            ColumnDefinition::new("Index", SqlType::Integer),
            ColumnDefinition::new("FileName", SqlType::VarChar(255)),
        ];
        store
            .replace_table(
                "files",
                &cols,
                &[
                    vec![CellValue::Integer(1), "old.csv".into()],
                    vec![CellValue::Integer(2), "older.csv".into()],
                ],
            )
            .unwrap();
        store
            .replace_table("files", &cols, &[vec![CellValue::Integer(1), "new.csv".into()]])
            .unwrap();

        assert_eq!(store.row_count("files").unwrap(), 1);
        let name: String = store
            .connection()
            .query_row("SELECT FileName FROM files", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "new.csv");
    }

    #[test]
    fn test_describe_reports_declared_types() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.create_table("flows", &columns()).unwrap();
        let described = store.describe_table("flows").unwrap();

        let summary: Vec<(&str, &str, bool)> = described
            .iter()
            .map(|c| (c.name.as_str(), c.declared_type.as_str(), c.primary_key))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", "INTEGER", true),
                ("Flow Duration", "FLOAT", false),
                ("source", "VARCHAR(255)", false),
            ]
        );
    }

    #[test]
    fn test_rejects_bad_table_name() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store.create_table("bad name", &columns()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidIdentifier(_)));
    }
}

//! Backing store for ingested tables

pub mod connection;
pub mod sqlite;
pub mod store;

pub use connection::{ConnectionFactory, SqliteConnectionFactory};
pub use sqlite::SqliteStore;
pub use store::{quote_ident, validate_distinct_tables, validate_table_name, ColumnDefinition, ColumnDescription, SqlType, TableStore};

//! Table Builder - Derives table columns from the schema and manages the
//! target table's create/drop/append lifecycle plus the two replace-on-write
//! side tables.

use crate::confirm::Confirm;
use crate::db::store::{validate_table_name, ColumnDefinition, SqlType, TableStore};
use crate::error::{LoadError, Result};
use crate::ingestion::label_encoder::LabelMapping;
use crate::ingestion::provenance::SourceRecord;
use crate::ingestion::schema::{Schema, FILE_NAME_COLUMN, ID_COLUMN, LABEL_COLUMN, SOURCE_COLUMN};
use crate::ingestion::value::CellValue;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const NAME_LENGTH: u32 = 255;

/// A column-name predicate paired with the type it selects
pub struct TypeRule {
    pub matches: fn(&str) -> bool,
    pub sql_type: SqlType,
}

fn is_file_name(name: &str) -> bool {
    name == FILE_NAME_COLUMN
}

fn is_label(name: &str) -> bool {
    name == LABEL_COLUMN
}

fn any_column(_: &str) -> bool {
    true
}

/// Evaluated top to bottom, first match wins. The last rule matches everything.
pub const TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        matches: is_file_name,
        sql_type: SqlType::VarChar(NAME_LENGTH),
    },
    TypeRule {
        matches: is_label,
        sql_type: SqlType::Integer,
    },
    TypeRule {
        matches: any_column,
        sql_type: SqlType::Float,
    },
];

pub fn column_type(name: &str) -> SqlType {
    TYPE_RULES
        .iter()
        .find(|rule| (rule.matches)(name))
        .map(|rule| rule.sql_type)
        .unwrap_or(SqlType::Float)
}

/// `id`, the schema columns typed by `TYPE_RULES`, then `source`
pub fn target_columns(schema: &Schema) -> Vec<ColumnDefinition> {
    let mut columns = Vec::with_capacity(schema.len() + 2);
    columns.push(ColumnDefinition::primary_key(ID_COLUMN));
    columns.extend(
        schema
            .columns()
            .iter()
            .map(|name| ColumnDefinition::new(name.clone(), column_type(name))),
    );
    columns.push(ColumnDefinition::new(SOURCE_COLUMN, SqlType::VarChar(NAME_LENGTH)));
    columns
}

pub fn label_table_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("Label", SqlType::VarChar(NAME_LENGTH)),
        ColumnDefinition::new("EncodedValue", SqlType::Integer),
    ]
}

pub fn provenance_table_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("Index", SqlType::Integer),
        ColumnDefinition::new("FileName", SqlType::VarChar(NAME_LENGTH)),
    ]
}

/// Where the target table stands before any data is written
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableState {
    Absent,
    Present,
}

/// How the target table became ready for appends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOutcome {
    /// Table did not exist and was created
    Created,
    /// Table existed, was dropped and created again
    Recreated,
    /// Table existed and is appended to as-is
    Appended,
}

pub struct TableLifecycleManager<'a> {
    table: &'a str,
    schema: &'a Schema,
}

impl<'a> TableLifecycleManager<'a> {
    pub fn new(table: &'a str, schema: &'a Schema) -> Result<Self> {
        validate_table_name(table)?;
        Ok(Self { table, schema })
    }

    pub fn state<S: TableStore>(&self, store: &S) -> Result<TableState> {
        if store.table_exists(self.table)? {
            Ok(TableState::Present)
        } else {
            Ok(TableState::Absent)
        }
    }

    /// Absent: create. Present: ask to drop and recreate, then ask to append;
    /// declining both aborts with nothing written.
    pub fn prepare<S: TableStore>(&self, store: &mut S, confirm: &mut dyn Confirm) -> Result<TableOutcome> {
        match self.state(store)? {
            TableState::Absent => {
                self.create(store)?;
                Ok(TableOutcome::Created)
            }
            TableState::Present => {
                warn!("Table '{}' already exists", self.table);

                let drop_question = format!(
                    "Table '{}' already exists. Drop it and start a fresh load?",
                    self.table
                );
                if confirm.confirm(&drop_question)? {
                    store.drop_table(self.table)?;
                    info!("Dropped table '{}'", self.table);
                    self.create(store)?;
                    return Ok(TableOutcome::Recreated);
                }

                let append_question = format!("Append the new rows to the existing table '{}'?", self.table);
                if confirm.confirm(&append_question)? {
                    info!("Appending to existing table '{}'", self.table);
                    return Ok(TableOutcome::Appended);
                }

                Err(LoadError::UserAbort {
                    table: self.table.to_string(),
                })
            }
        }
    }

    fn create<S: TableStore>(&self, store: &mut S) -> Result<()> {
        store.create_table(self.table, &target_columns(self.schema))?;
        info!("Created table '{}' with {} data columns", self.table, self.schema.len());
        Ok(())
    }

    /// Column names for appends: schema columns, then `source`
    pub fn insert_columns(&self) -> Vec<String> {
        let mut columns = self.schema.columns().to_vec();
        columns.push(SOURCE_COLUMN.to_string());
        columns
    }
}

/// Replace-on-write for the label mapping table
pub fn save_label_mapping<S: TableStore>(store: &mut S, table: &str, mapping: &LabelMapping) -> Result<()> {
    let rows: Vec<Vec<CellValue>> = mapping
        .entries()
        .iter()
        .map(|(label, code)| vec![CellValue::Text(label.clone()), CellValue::Integer(*code)])
        .collect();
    store.replace_table(table, &label_table_columns(), &rows)?;
    info!("Saved {} label mappings to '{}'", rows.len(), table);
    Ok(())
}

/// Replace-on-write for the provenance table
pub fn save_provenance<S: TableStore>(store: &mut S, table: &str, records: &[SourceRecord]) -> Result<()> {
    let rows: Vec<Vec<CellValue>> = records
        .iter()
        .map(|r| vec![CellValue::Integer(r.index as i64), CellValue::Text(r.file_name.clone())])
        .collect();
    store.replace_table(table, &provenance_table_columns(), &rows)?;
    info!("Saved {} source file records to '{}'", rows.len(), table);
    Ok(())
}

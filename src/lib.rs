pub mod config;
pub mod confirm;
pub mod db;
pub mod error;
pub mod ingestion;

pub use config::{DatabaseCredentials, LoaderConfig};
pub use confirm::{Confirm, ConsoleConfirm, ExistingTableAction, PresetConfirm, ScriptedConfirm};
pub use db::{ConnectionFactory, SqliteConnectionFactory, SqliteStore, TableStore};
pub use error::{LoadError, Result};
pub use ingestion::{
    FailurePolicy, FileReport, FileStatus, IngestionOptions, IngestionPipeline, IngestionReport, IngestionRequest,
    LabelMapping, Schema, TableOutcome, UnmappedLabelPolicy,
};

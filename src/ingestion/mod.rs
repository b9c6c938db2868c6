//! Ingestion Module
//!
//! Loads a batch of CSV files that share one fixed schema into a single table:
//! - Schema validation (exact, order-sensitive)
//! - Sanitization of missing and non-finite values
//! - Label encoding through a caller-supplied mapping
//! - Target table lifecycle (create / drop-and-recreate / append)
//! - Per-file provenance, replaced on every run

pub mod csv_source;
pub mod label_encoder;
pub mod orchestrator;
pub mod provenance;
pub mod sanitizer;
pub mod schema;
pub mod table_builder;
pub mod value;

pub use csv_source::{CsvFrame, CsvSource};
pub use label_encoder::{EncodingStats, LabelEncoder, LabelMapping, UnmappedLabelPolicy};
pub use orchestrator::{IngestionOptions, IngestionPipeline, IngestionRequest};
pub use provenance::{ProvenanceTracker, SourceRecord};
pub use sanitizer::ValueSanitizer;
pub use schema::{Schema, SchemaValidator};
pub use table_builder::{TableLifecycleManager, TableOutcome, TableState, TypeRule, TYPE_RULES};
pub use value::CellValue;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// How a failure confined to one input file affects the rest of the run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first error. Files already written stay written.
    #[default]
    AbortRun,
    /// Record the failure, skip the file and continue. Store errors still abort.
    SkipFile,
}

/// Ingestion result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestionReport {
    pub run_id: Uuid,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    pub target_table: String,

    pub table_outcome: TableOutcome,

    /// One entry per input file, in input order
    pub files: Vec<FileReport>,

    pub rows_written: u64,
}

impl IngestionReport {
    pub fn written_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.status == FileStatus::Written)
    }

    pub fn skipped_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.status != FileStatus::Written)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileReport {
    /// 1-based position in the input list; also the `source` value of its rows
    pub index: usize,

    pub file_name: String,

    pub path: PathBuf,

    pub rows_written: usize,

    pub cells_sanitized: usize,

    pub labels_unmapped: usize,

    pub status: FileStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Written,
    Skipped { reason: String },
}

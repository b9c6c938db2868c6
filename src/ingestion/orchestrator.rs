//! Ingestion Orchestrator - Drives one run over the whole file list

use crate::config::LoaderConfig;
use crate::confirm::Confirm;
use crate::db::store::{validate_distinct_tables, TableStore};
use crate::error::{LoadError, Result};
use crate::ingestion::csv_source::{file_name_of, CsvSource};
use crate::ingestion::label_encoder::{LabelEncoder, LabelMapping, UnmappedLabelPolicy};
use crate::ingestion::provenance::ProvenanceTracker;
use crate::ingestion::sanitizer::ValueSanitizer;
use crate::ingestion::schema::{Schema, SchemaValidator};
use crate::ingestion::table_builder::{save_label_mapping, save_provenance, TableLifecycleManager};
use crate::ingestion::value::CellValue;
use crate::ingestion::{FailurePolicy, FileReport, FileStatus, IngestionReport};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Inputs of a single run, already resolved by the caller
#[derive(Clone, Debug)]
pub struct IngestionRequest {
    pub files: Vec<PathBuf>,
    pub target_table: String,
    pub schema: Schema,
    pub label_mapping: LabelMapping,
    pub provenance_table: String,
    pub label_table: String,
}

impl IngestionRequest {
    pub fn from_config(config: &LoaderConfig, files: Vec<PathBuf>) -> Self {
        Self {
            files,
            target_table: config.target_table.clone(),
            schema: config.schema.clone(),
            label_mapping: config.label_mapping.clone(),
            provenance_table: config.provenance_table.clone(),
            label_table: config.label_table.clone(),
        }
    }

    /// At least one file, and three distinct valid table names. Side tables
    /// are replaced on write and must never share the target's name.
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(LoadError::Config("no input files".to_string()));
        }
        validate_distinct_tables(&[
            self.target_table.as_str(),
            self.provenance_table.as_str(),
            self.label_table.as_str(),
        ])
    }
}

/// Options controlling how per-file problems are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionOptions {
    pub unmapped_labels: UnmappedLabelPolicy,
    pub on_file_error: FailurePolicy,
}

impl From<&LoaderConfig> for IngestionOptions {
    fn from(config: &LoaderConfig) -> Self {
        Self {
            unmapped_labels: config.unmapped_labels,
            on_file_error: config.on_file_error,
        }
    }
}

/// Ingestion Pipeline - validate, sanitize, encode, tag and append each file
/// in order, then persist provenance.
pub struct IngestionPipeline {
    sanitizer: ValueSanitizer,
    options: IngestionOptions,
}

impl IngestionPipeline {
    pub fn new() -> Self {
        Self::with_options(IngestionOptions::default())
    }

    pub fn with_options(options: IngestionOptions) -> Self {
        Self {
            sanitizer: ValueSanitizer::new(),
            options,
        }
    }

    pub fn options(&self) -> &IngestionOptions {
        &self.options
    }

    /// Run the whole batch. Nothing is written if the operator declines both
    /// drop and append. On an aborting error, files before the failing one
    /// stay in the target table and the provenance table is left untouched.
    pub fn run<S: TableStore>(
        &self,
        store: &mut S,
        request: &IngestionRequest,
        confirm: &mut dyn Confirm,
    ) -> Result<IngestionReport> {
        request.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "Ingestion run {} started: {} files into '{}'",
            run_id,
            request.files.len(),
            request.target_table
        );

        let manager = TableLifecycleManager::new(&request.target_table, &request.schema)?;
        let table_outcome = manager.prepare(store, confirm)?;

        save_label_mapping(store, &request.label_table, &request.label_mapping)?;

        let insert_columns = manager.insert_columns();
        let mut tracker = ProvenanceTracker::new();
        let mut files = Vec::with_capacity(request.files.len());

        for (position, path) in request.files.iter().enumerate() {
            let index = position + 1;
            match self.ingest_file(store, request, &insert_columns, index, path) {
                Ok(report) => {
                    tracker.record(index, path);
                    files.push(report);
                }
                Err(e) if e.is_file_scoped() && self.options.on_file_error == FailurePolicy::SkipFile => {
                    warn!("Skipping {}: {}", path.display(), e);
                    files.push(FileReport {
                        index,
                        file_name: file_name_of(path),
                        path: path.clone(),
                        rows_written: 0,
                        cells_sanitized: 0,
                        labels_unmapped: 0,
                        status: FileStatus::Skipped { reason: e.to_string() },
                    });
                }
                Err(e) => {
                    error!("Ingestion stopped at {} (file {} of {}): {}", path.display(), index, request.files.len(), e);
                    return Err(e);
                }
            }
        }

        save_provenance(store, &request.provenance_table, tracker.records())?;

        let rows_written = files.iter().map(|f| f.rows_written as u64).sum();
        let report = IngestionReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            target_table: request.target_table.clone(),
            table_outcome,
            files,
            rows_written,
        };

        info!(
            "Ingestion run {} finished: {} rows from {} files ({} skipped)",
            run_id,
            report.rows_written,
            report.written_files().count(),
            report.skipped_files().count()
        );

        Ok(report)
    }

    fn ingest_file<S: TableStore>(
        &self,
        store: &mut S,
        request: &IngestionRequest,
        insert_columns: &[String],
        index: usize,
        path: &Path,
    ) -> Result<FileReport> {
        let file = path.display().to_string();
        let frame = CsvSource::new(path).read()?;

        SchemaValidator::new(&request.schema).validate(&file, &frame.headers)?;

        let mut rows = frame.rows;
        let label_position = request.schema.label_position();
        let empty_labels: HashSet<usize> = match label_position {
            Some(pos) => rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.get(pos).map_or(true, CellValue::is_invalid))
                .map(|(idx, _)| idx + 1)
                .collect(),
            None => HashSet::new(),
        };

        let cells_sanitized = self.sanitizer.sanitize(&mut rows);

        let mut labels_unmapped = 0;
        if let Some(label_position) = label_position {
            let encoder = LabelEncoder::new(&request.label_mapping, self.options.unmapped_labels);
            let stats = encoder
                .encode(&file, label_position, &mut rows)
                .map_err(|e| match e {
                    LoadError::UnmappedLabel { file, row, label } if empty_labels.contains(&row) => {
                        LoadError::UnmappedLabel {
                            file,
                            row,
                            label: format!("{} (cell was empty)", label),
                        }
                    }
                    other => other,
                })?;
            if stats.unmapped > 0 {
                warn!("{}: {} labels had no mapping and were stored as NULL", file, stats.unmapped);
            }
            labels_unmapped = stats.unmapped;
        }

        let source = CellValue::Text(index.to_string());
        for row in rows.iter_mut() {
            row.push(source.clone());
        }

        let rows_written = store.append_rows(&request.target_table, insert_columns, &rows)?;
        info!(
            "{} saved to '{}' ({} rows, {} cells sanitized)",
            file, request.target_table, rows_written, cells_sanitized
        );

        Ok(FileReport {
            index,
            file_name: file_name_of(path),
            path: path.to_path_buf(),
            rows_written,
            cells_sanitized,
            labels_unmapped,
            status: FileStatus::Written,
        })
    }
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

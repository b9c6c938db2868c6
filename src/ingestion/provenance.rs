//! Provenance - Track source index → input file name

use crate::ingestion::csv_source::file_name_of;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One processed input file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// 1-based position in the input file list
    pub index: usize,

    /// Base name of the input path
    pub file_name: String,
}

/// Provenance Tracker - ordered record of the files written in this run
#[derive(Clone, Debug, Default)]
pub struct ProvenanceTracker {
    records: Vec<SourceRecord>,
}

impl ProvenanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, index: usize, path: &Path) -> &SourceRecord {
        self.records.push(SourceRecord {
            index,
            file_name: file_name_of(path),
        });
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

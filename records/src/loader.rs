//! Record batch loading from JSON and YAML files.
//!
//! A record file holds either a bare list of records or an object with a
//! `records` list. A directory is loaded as the concatenation of its record
//! files in file-name order. Every loaded batch is validated at the boundary
//! (non-empty unique ids, finite scores) before it is handed to the analyzer.
//!
//! ```no_run
//! use note_funnel_records::RecordBatch;
//!
//! let batch = RecordBatch::from_path("exports/records.json").unwrap();
//! println!("loaded {} records", batch.len());
//! ```

use std::path::{Path, PathBuf};

use note_funnel_core::{PipelineRunRecord, validate_batch};
use serde::Deserialize;
use tracing::debug;

use crate::error::{RecordsError, Result};

/// Describes where a [`RecordBatch`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    /// A single record file.
    File(PathBuf),
    /// Every record file in a directory.
    Directory(PathBuf),
    /// An in-memory document (e.g. stdin).
    Inline,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordDocument {
    List(Vec<PipelineRunRecord>),
    Wrapped { records: Vec<PipelineRunRecord> },
}

impl RecordDocument {
    fn into_records(self) -> Vec<PipelineRunRecord> {
        match self {
            Self::List(records) | Self::Wrapped { records } => records,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// An ordered, validated batch of records.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    records: Vec<PipelineRunRecord>,
    source: RecordSource,
}

impl RecordBatch {
    /// Loads from a record file or a directory of record files.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::IoError`] if a path cannot be read,
    /// [`RecordsError::JsonError`] / [`RecordsError::YamlError`] on malformed
    /// documents, [`RecordsError::UnsupportedFormat`] for a file that is
    /// neither JSON nor YAML, [`RecordsError::NoRecordFiles`] for a directory
    /// without record files, or [`RecordsError::InvalidRecord`] when
    /// validation fails.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_file(path)
        }
    }

    /// Loads a single JSON or YAML record file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let records = read_record_file(path)?;
        Self::validated(records, RecordSource::File(path.to_path_buf()))
    }

    /// Loads every `*.json`, `*.yaml` and `*.yml` file in a directory,
    /// sorted by file name.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() && DocumentFormat::from_path(&file_path).is_some() {
                files.push(file_path);
            }
        }
        if files.is_empty() {
            return Err(RecordsError::NoRecordFiles(path.display().to_string()));
        }
        files.sort();

        let mut records = Vec::new();
        for file in &files {
            records.extend(read_record_file(file)?);
        }
        Self::validated(records, RecordSource::Directory(path.to_path_buf()))
    }

    /// Parses a JSON document held in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use note_funnel_records::RecordBatch;
    ///
    /// let raw = r#"{"records": [{"id": "a"}, {"id": "b"}]}"#;
    /// let batch = RecordBatch::from_json_str(raw).unwrap();
    /// assert_eq!(batch.len(), 2);
    ///
    /// let dupes = RecordBatch::from_json_str(r#"[{"id": "a"}, {"id": "a"}]"#);
    /// assert!(dupes.is_err());
    /// ```
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let document: RecordDocument = serde_json::from_str(raw)?;
        Self::validated(document.into_records(), RecordSource::Inline)
    }

    /// Wraps records built in memory, validating them.
    pub fn from_records(records: Vec<PipelineRunRecord>) -> Result<Self> {
        Self::validated(records, RecordSource::Inline)
    }

    fn validated(records: Vec<PipelineRunRecord>, source: RecordSource) -> Result<Self> {
        if let Some(err) = validate_batch(&records).into_iter().next() {
            return Err(err.into());
        }
        debug!(count = records.len(), source = ?source, "loaded record batch");
        Ok(Self { records, source })
    }

    pub fn records(&self) -> &[PipelineRunRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PipelineRunRecord> {
        self.records
    }

    pub fn source(&self) -> &RecordSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_record_file(path: &Path) -> Result<Vec<PipelineRunRecord>> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| RecordsError::UnsupportedFormat(path.display().to_string()))?;
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let document: RecordDocument = match format {
        DocumentFormat::Json => serde_json::from_reader(reader)?,
        DocumentFormat::Yaml => serde_yaml::from_reader(reader)?,
    };
    Ok(document.into_records())
}

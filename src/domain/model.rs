use crate::utils::error::IngestError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Raw bytes of one uploaded screenshot. Owned by a single pipeline run.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }
}

/// One person extracted from a screenshot, as a flat field map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileRecord {
    fields: Map<String, Value>,
}

impl ProfileRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for ProfileRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Records normalized from one image.
///
/// Every record carries the same `source_file` and `processed_at` and the same
/// key set, listed in `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    source_file: String,
    processed_at: String,
    columns: Vec<String>,
    records: Vec<ProfileRecord>,
}

impl RecordBatch {
    pub(crate) fn new(
        source_file: String,
        processed_at: String,
        columns: Vec<String>,
        records: Vec<ProfileRecord>,
    ) -> Self {
        Self {
            source_file,
            processed_at,
            columns,
            records,
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn processed_at(&self) -> &str {
        &self.processed_at
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Decoding,
    Extracting,
    Recovering,
    Normalizing,
    Forwarding,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decoding => "decoding",
            Self::Extracting => "extracting",
            Self::Recovering => "recovering",
            Self::Normalizing => "normalizing",
            Self::Forwarding => "forwarding",
        };
        f.write_str(name)
    }
}

/// Terminal state of one pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    Succeeded {
        filename: String,
        records_forwarded: usize,
    },
    Failed {
        filename: String,
        stage: PipelineStage,
        error: IngestError,
    },
}

impl PipelineOutcome {
    pub fn filename(&self) -> &str {
        match self {
            Self::Succeeded { filename, .. } | Self::Failed { filename, .. } => filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn failed_stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Failed { stage, .. } => Some(*stage),
            Self::Succeeded { .. } => None,
        }
    }
}

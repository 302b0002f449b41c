use crate::domain::model::RecordBatch;
use crate::domain::ports::RecordSink;
use crate::domain::schema::INGESTED_AT_FIELD;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Appends batches to a local CSV file the way the sheet service appends rows.
///
/// A new or empty file gets a header from the first batch plus `ingested_at`.
/// Later batches are aligned to the existing header; columns it lacks are dropped
/// and cells it expects but the batch lacks are left empty.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn forward(&self, batch: &RecordBatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let ingested_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let rows = append_batch(&self.path, batch, &ingested_at).map_err(|e| {
            IngestError::sink(format!("failed to append to {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(path = %self.path.display(), rows, "Appended batch to CSV");
        Ok(())
    }
}

fn existing_header(path: &Path) -> Result<Option<Vec<String>>> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let header = reader.headers()?.iter().map(String::from).collect();
    Ok(Some(header))
}

fn append_batch(path: &Path, batch: &RecordBatch, ingested_at: &str) -> Result<usize> {
    let existing = existing_header(path)?;
    let write_header = existing.is_none();
    let header = existing.unwrap_or_else(|| {
        let mut header = batch.columns().to_vec();
        header.push(INGESTED_AT_FIELD.to_string());
        header
    });

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if write_header {
        writer.write_record(&header)?;
    }

    for record in batch.records() {
        let row = header.iter().map(|column| {
            if column == INGESTED_AT_FIELD {
                ingested_at.to_string()
            } else {
                record.get(column).map(cell_text).unwrap_or_default()
            }
        });
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(batch.len())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

use crate::domain::model::{ProfileRecord, RecordBatch};
use crate::domain::schema::{
    is_provenance_field, INGESTED_AT_FIELD, PROCESSED_AT_FIELD, PROFILE_FIELDS, SOURCE_FILE_FIELD,
};
use crate::utils::error::{IngestError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Normalize recovered records, stamping them with the current time.
pub fn normalize(records: Value, source_file: &str) -> Result<RecordBatch> {
    normalize_at(records, source_file, Utc::now())
}

/// Normalize recovered records into a uniform batch.
///
/// Columns are the profile fields, then any extra fields seen in input order,
/// then `source_file` and `processed_at`. Missing and null cells become empty
/// strings. `ingested_at` is dropped because the sink owns it.
pub fn normalize_at(
    records: Value,
    source_file: &str,
    processed_at: DateTime<Utc>,
) -> Result<RecordBatch> {
    let items = match records {
        Value::Array(items) => items,
        other => {
            return Err(IngestError::normalization(format!(
                "expected an array of records, got {}",
                json_kind(&other)
            )))
        }
    };

    if items.is_empty() {
        return Err(IngestError::normalization("no records to normalize"));
    }

    let rows = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(IngestError::normalization(format!(
                "record {} is {}, not an object",
                index,
                json_kind(&other)
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    let columns = collect_columns(&rows);
    let stamp = processed_at.to_rfc3339_opts(SecondsFormat::Micros, true);

    let records = rows
        .into_iter()
        .map(|mut row| {
            let mut record = ProfileRecord::default();
            for column in &columns {
                let value = match column.as_str() {
                    SOURCE_FILE_FIELD => Value::String(source_file.to_string()),
                    PROCESSED_AT_FIELD => Value::String(stamp.clone()),
                    field => match row.remove(field) {
                        None | Some(Value::Null) => Value::String(String::new()),
                        Some(value) => value,
                    },
                };
                record.insert(column.clone(), value);
            }
            record
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        source_file,
        records = records.len(),
        columns = columns.len(),
        "Normalized record batch"
    );

    Ok(RecordBatch::new(
        source_file.to_string(),
        stamp,
        columns,
        records,
    ))
}

fn collect_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = PROFILE_FIELDS.iter().map(|f| f.to_string()).collect();
    for row in rows {
        for key in row.keys() {
            if is_provenance_field(key) || key == INGESTED_AT_FIELD {
                continue;
            }
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns.push(SOURCE_FILE_FIELD.to_string());
    columns.push(PROCESSED_AT_FIELD.to_string());
    columns
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

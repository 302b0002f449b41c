use crate::config::SinkConfig;
use crate::domain::model::RecordBatch;
use crate::domain::ports::RecordSink;
use crate::domain::schema::SINK_PAYLOAD_KEY;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Posts each batch to the spreadsheet append service in a single request.
///
/// At most one attempt per batch. A 2xx only means the service accepted it;
/// what happens to the rows afterwards is not observed.
#[derive(Debug, Clone)]
pub struct SheetSink {
    client: Client,
    endpoint: String,
}

impl SheetSink {
    pub fn new(config: &SinkConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IngestError::ConfigError {
                message: format!("failed to build sink HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl RecordSink for SheetSink {
    async fn forward(&self, batch: &RecordBatch) -> Result<()> {
        let payload = sheet_payload(batch)?;

        tracing::debug!(
            endpoint = %self.endpoint,
            records = batch.len(),
            source_file = batch.source_file(),
            "Forwarding batch to sheet service"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| IngestError::sink(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::sink(format!(
                "sheet service rejected batch with status {}",
                status
            )));
        }

        Ok(())
    }
}

/// `{"data": [record, ...]}`
fn sheet_payload(batch: &RecordBatch) -> Result<serde_json::Value> {
    let records = serde_json::to_value(batch.records())
        .map_err(|e| IngestError::sink(format!("failed to serialize batch: {}", e)))?;
    let mut payload = serde_json::Map::new();
    payload.insert(SINK_PAYLOAD_KEY.to_string(), records);
    Ok(serde_json::Value::Object(payload))
}

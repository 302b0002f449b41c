// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod csv_sink;
pub mod ollama;
pub mod sheet_sink;

use crate::config::{AppConfig, SinkKind};
use crate::core::ingestion::IngestionPipeline;
use crate::domain::ports::RecordSink;
use crate::utils::error::Result;
use std::sync::Arc;

pub use csv_sink::CsvSink;
pub use ollama::OllamaVisionModel;
pub use sheet_sink::SheetSink;

pub fn build_sink(config: &AppConfig) -> Result<Arc<dyn RecordSink>> {
    let sink: Arc<dyn RecordSink> = match config.sink.kind {
        SinkKind::Http => Arc::new(SheetSink::new(&config.sink)?),
        SinkKind::Csv => Arc::new(CsvSink::new(&config.sink.csv_path)),
    };
    Ok(sink)
}

/// Wire the configured model and sink into a shareable pipeline.
pub fn build_pipeline(config: &AppConfig) -> Result<Arc<IngestionPipeline>> {
    let model = Arc::new(OllamaVisionModel::new(&config.model)?);
    let sink = build_sink(config)?;
    Ok(Arc::new(IngestionPipeline::new(model, sink)))
}

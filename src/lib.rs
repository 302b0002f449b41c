pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};

pub use adapters::{build_pipeline, build_sink, CsvSink, OllamaVisionModel, SheetSink};
pub use config::AppConfig;
pub use crate::core::ingestion::IngestionPipeline;
pub use domain::model::{PipelineOutcome, PipelineStage, ProfileRecord, RecordBatch, UploadedImage};
pub use utils::error::{IngestError, Result};

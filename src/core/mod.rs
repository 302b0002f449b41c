pub mod ingestion;
pub mod normalizer;
pub mod recovery;

pub use crate::domain::model::{PipelineOutcome, PipelineStage, ProfileRecord, RecordBatch};
pub use crate::domain::ports::{RecordSink, VisionModel};
pub use crate::utils::error::Result;

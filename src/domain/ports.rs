use crate::domain::model::RecordBatch;
use crate::utils::error::Result;
use async_trait::async_trait;
use image::DynamicImage;

/// Remote vision-language model: `image x prompt -> text`.
///
/// Implementations hold only static configuration, so one instance is shared
/// by every concurrent pipeline run. The image is handed over so encoding can
/// move it onto a blocking thread.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn extract(&self, image: DynamicImage, prompt: &str) -> Result<String>;
}

/// Append-only destination for normalized batches.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn forward(&self, batch: &RecordBatch) -> Result<()>;
}

use crate::core::{normalizer, recovery};
use crate::domain::model::{PipelineOutcome, PipelineStage, RecordBatch, UploadedImage};
use crate::domain::ports::{RecordSink, VisionModel};
use crate::domain::schema;
use crate::utils::error::{IngestError, Result};
use image::DynamicImage;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Runs one screenshot through decode, extract, recover, normalize and forward.
///
/// Holds only shared read-only handles, so a single instance behind an `Arc`
/// serves every concurrent upload. Each run owns its image, model output and
/// batch; nothing is shared between runs.
pub struct IngestionPipeline {
    model: Arc<dyn VisionModel>,
    sink: Arc<dyn RecordSink>,
}

type StageResult<T> = std::result::Result<T, (PipelineStage, IngestError)>;

fn at<T>(stage: PipelineStage, result: Result<T>) -> StageResult<T> {
    result.map_err(|e| (stage, e))
}

impl IngestionPipeline {
    pub fn new(model: Arc<dyn VisionModel>, sink: Arc<dyn RecordSink>) -> Self {
        Self { model, sink }
    }

    /// Start a detached run and return immediately.
    ///
    /// The caller may drop the handle; the run still completes and logs its outcome.
    pub fn spawn(self: &Arc<Self>, upload: UploadedImage) -> JoinHandle<PipelineOutcome> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.process(upload).await })
    }

    /// Like [`spawn`](Self::spawn), but also watches the run so a panic still
    /// produces a terminal log line. Yields `None` when the run did not finish.
    pub fn spawn_supervised(
        self: &Arc<Self>,
        upload: UploadedImage,
    ) -> JoinHandle<Option<PipelineOutcome>> {
        let filename = upload.filename.clone();
        let run = self.spawn(upload);
        tokio::spawn(async move {
            match run.await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::error!(
                        filename = %filename,
                        error = %e,
                        "❌ Screenshot processing aborted"
                    );
                    None
                }
            }
        })
    }

    /// Run to a terminal state. Failures are logged here and never propagated.
    pub async fn process(&self, upload: UploadedImage) -> PipelineOutcome {
        let filename = upload.filename.clone();
        tracing::info!(filename = %filename, bytes = upload.bytes.len(), "🚀 Processing screenshot");

        match self.execute(upload).await {
            Ok(batch) => {
                tracing::info!(
                    filename = %filename,
                    records = batch.len(),
                    "✅ Screenshot forwarded to sink"
                );
                PipelineOutcome::Succeeded {
                    filename,
                    records_forwarded: batch.len(),
                }
            }
            Err((stage, error)) => {
                tracing::error!(
                    filename = %filename,
                    stage = %stage,
                    error = %error,
                    "❌ Screenshot processing failed"
                );
                PipelineOutcome::Failed {
                    filename,
                    stage,
                    error,
                }
            }
        }
    }

    async fn execute(&self, upload: UploadedImage) -> StageResult<RecordBatch> {
        let UploadedImage { bytes, filename } = upload;

        let image = at(PipelineStage::Decoding, decode_image(bytes).await)?;

        tracing::debug!(filename = %filename, "Requesting extraction from model");
        let raw_output = at(
            PipelineStage::Extracting,
            self.model.extract(image, schema::extraction_prompt()).await,
        )?;

        let recovered = at(PipelineStage::Recovering, recovery::recover(&raw_output))?;
        let batch = at(
            PipelineStage::Normalizing,
            normalizer::normalize(recovered, &filename),
        )?;

        at(PipelineStage::Forwarding, self.sink.forward(&batch).await)?;
        Ok(batch)
    }
}

// Decoding is CPU-bound; keep it off the async workers.
async fn decode_image(bytes: Vec<u8>) -> Result<DynamicImage> {
    let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await?;
    Ok(decoded?)
}

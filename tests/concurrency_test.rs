use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use screenshot_etl::domain::ports::{RecordSink, VisionModel};
use screenshot_etl::{IngestionPipeline, RecordBatch, Result, UploadedImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Answers by image width, and makes the narrower image slower so the runs overlap.
struct WidthKeyedModel;

#[async_trait]
impl VisionModel for WidthKeyedModel {
    async fn extract(&self, image: DynamicImage, _prompt: &str) -> Result<String> {
        let (width, _) = image.dimensions();
        if width == 2 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(r#"[{"name":"Ada","title_or_role":"Engineer"},{"name":"Charles"}]"#.to_string())
        } else {
            Ok(r#"[{"name":"Grace","organization_or_context":"Navy","rank":"Admiral"}]"#
                .to_string())
        }
    }
}

#[derive(Default)]
struct CollectingSink {
    batches: Mutex<Vec<RecordBatch>>,
}

#[async_trait]
impl RecordSink for CollectingSink {
    async fn forward(&self, batch: &RecordBatch) -> Result<()> {
        self.batches.lock().await.push(batch.clone());
        Ok(())
    }
}

fn png_of_width(width: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(width, 2))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_uploads_produce_independent_batches() {
    let sink = Arc::new(CollectingSink::default());
    let pipeline = Arc::new(IngestionPipeline::new(Arc::new(WidthKeyedModel), sink.clone()));

    let first = pipeline.spawn(UploadedImage::new(png_of_width(2), "analytical.png"));
    let second = pipeline.spawn(UploadedImage::new(png_of_width(3), "compiler.png"));

    assert!(first.await.unwrap().is_success());
    assert!(second.await.unwrap().is_success());

    let batches = sink.batches.lock().await;
    assert_eq!(batches.len(), 2);

    let analytical = batches
        .iter()
        .find(|b| b.source_file() == "analytical.png")
        .unwrap();
    let compiler = batches
        .iter()
        .find(|b| b.source_file() == "compiler.png")
        .unwrap();

    let names = |batch: &RecordBatch| -> Vec<String> {
        batch
            .records()
            .iter()
            .map(|r| r.get_str("name").unwrap_or_default().to_string())
            .collect()
    };
    assert_eq!(names(analytical), vec!["Ada", "Charles"]);
    assert_eq!(names(compiler), vec!["Grace"]);

    for batch in [analytical, compiler] {
        for record in batch.records() {
            assert_eq!(record.get_str("source_file"), Some(batch.source_file()));
            assert_eq!(record.get_str("processed_at"), Some(batch.processed_at()));
        }
    }
    assert!(!analytical.columns().contains(&"rank".to_string()));
    assert!(compiler.columns().contains(&"rank".to_string()));
}

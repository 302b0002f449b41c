use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use image::{DynamicImage, ImageFormat, RgbImage};
use screenshot_etl::config::ServerConfig;
use screenshot_etl::domain::ports::{RecordSink, VisionModel};
use screenshot_etl::server::{router, AppState};
use screenshot_etl::{IngestionPipeline, RecordBatch, Result};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tower::ServiceExt;

const BOUNDARY: &str = "----screenshot-etl-boundary";

/// Holds every extraction until released, so the 202 provably arrives first.
struct GatedModel {
    release: Arc<Notify>,
}

#[async_trait]
impl VisionModel for GatedModel {
    async fn extract(&self, _image: DynamicImage, _prompt: &str) -> Result<String> {
        self.release.notified().await;
        Ok(r#"[{"name":"Ada","title_or_role":"Engineer"}]"#.to_string())
    }
}

struct ChannelSink {
    tx: mpsc::UnboundedSender<RecordBatch>,
}

#[async_trait]
impl RecordSink for ChannelSink {
    async fn forward(&self, batch: &RecordBatch) -> Result<()> {
        let _ = self.tx.send(batch.clone());
        Ok(())
    }
}

fn png() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(4, 4))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload/extract")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn app() -> (axum::Router, Arc<Notify>, mpsc::UnboundedReceiver<RecordBatch>) {
    app_with(&ServerConfig::default())
}

fn app_with(
    config: &ServerConfig,
) -> (axum::Router, Arc<Notify>, mpsc::UnboundedReceiver<RecordBatch>) {
    let release = Arc::new(Notify::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = Arc::new(IngestionPipeline::new(
        Arc::new(GatedModel {
            release: release.clone(),
        }),
        Arc::new(ChannelSink { tx }),
    ));
    let router = router(AppState::new(pipeline), config);
    (router, release, rx)
}

#[tokio::test]
async fn test_upload_is_accepted_before_processing() {
    let (app, release, mut rx) = app();

    let response = app
        .oneshot(upload_request(multipart_body("file", "cards.png", &png())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "message": "Screenshot accepted",
            "filename": "cards.png",
            "status": "processing"
        })
    );
    assert!(rx.try_recv().is_err());

    release.notify_one();
    let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("pipeline did not finish")
        .expect("sink channel closed");
    assert_eq!(batch.source_file(), "cards.png");
    assert_eq!(batch.records()[0].get_str("name"), Some("Ada"));
}

#[tokio::test]
async fn test_upload_without_file_field_is_rejected() {
    let (app, _release, _rx) = app();

    let response = app
        .oneshot(upload_request(multipart_body("attachment", "cards.png", &png())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let (app, _release, _rx) = app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_with_413() {
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..Default::default()
    };
    let (app, _release, mut rx) = app_with(&config);

    let response = app
        .oneshot(upload_request(multipart_body(
            "file",
            "huge.png",
            &vec![0u8; 10 * 1024],
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_upload_within_limit_is_accepted() {
    let config = ServerConfig {
        max_upload_bytes: 64 * 1024,
        ..Default::default()
    };
    let (app, _release, _rx) = app_with(&config);

    let response = app
        .oneshot(upload_request(multipart_body("file", "cards.png", &png())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

fn health_from(origin: &str) -> Request<Body> {
    Request::builder()
        .uri("/health")
        .header("origin", origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_allowed_origin_gets_cors_header() {
    let (app, _release, _rx) = app();

    let response = app
        .oneshot(health_from("http://localhost:5173"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn test_unlisted_origin_gets_no_cors_header() {
    let (app, _release, _rx) = app();

    let response = app
        .oneshot(health_from("http://evil.example"))
        .await
        .unwrap();

    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn test_preflight_from_allowed_origin() {
    let (app, _release, _rx) = app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/upload/extract")
                .header("origin", "http://127.0.0.1:3000")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://127.0.0.1:3000"
    );
}

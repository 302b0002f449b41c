//! Upload surface: accepts a screenshot, answers 202 and runs the pipeline detached.

use crate::config::ServerConfig;
use crate::core::ingestion::IngestionPipeline;
use crate::domain::model::UploadedImage;
use crate::utils::error::Result;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<IngestionPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestionPipeline>) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Serialize)]
struct UploadAccepted {
    message: &'static str,
    filename: String,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(error: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Keeps the status the multipart layer chose, so an oversized body is a 413.
fn multipart_rejection(error: MultipartError) -> Response {
    (
        error.status(),
        Json(ErrorResponse {
            error: error.body_text(),
        }),
    )
        .into_response()
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload/extract", post(upload_screenshot))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn upload_screenshot(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(status = %e.status(), "Rejected multipart upload: {}", e);
                return multipart_rejection(e);
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        match field.bytes().await {
            Ok(bytes) => upload = Some(UploadedImage::new(bytes.to_vec(), filename)),
            Err(e) => {
                tracing::warn!(filename = %filename, status = %e.status(), "Failed to read upload bytes: {}", e);
                return multipart_rejection(e);
            }
        }
    }

    let Some(upload) = upload else {
        return bad_request("missing `file` field");
    };

    let filename = upload.filename.clone();
    // Detached: the outcome is only logged, panics included.
    let _ = state.pipeline.spawn_supervised(upload);

    (
        StatusCode::ACCEPTED,
        Json(UploadAccepted {
            message: "Screenshot accepted",
            filename,
            status: "processing",
        }),
    )
        .into_response()
}

pub async fn serve(config: &ServerConfig, pipeline: Arc<IngestionPipeline>) -> Result<()> {
    let app = router(AppState::new(pipeline), config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Upload server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

use crate::config::ModelConfig;
use crate::domain::ports::VisionModel;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;

/// Decoding is always greedy so the same screenshot yields the same rows.
const TEMPERATURE: f32 = 0.0;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: [String; 1],
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Vision model reached through an Ollama-style `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaVisionModel {
    client: Client,
    endpoint: String,
    model: String,
    max_output_tokens: u32,
}

impl OllamaVisionModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IngestError::ConfigError {
                message: format!("failed to build model HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
        })
    }
}

#[async_trait]
impl VisionModel for OllamaVisionModel {
    async fn extract(&self, image: DynamicImage, prompt: &str) -> Result<String> {
        // PNG encoding is CPU-bound; run it on the blocking pool.
        let encoded = tokio::task::spawn_blocking(move || encode_png_base64(&image)).await??;

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            images: [encoded],
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: self.max_output_tokens,
            },
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "Calling vision model");
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::model_call(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::model_call(format!(
                "model endpoint returned status {}",
                status
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| IngestError::model_call(format!("response is not JSON: {}", e)))?;

        let output = body
            .get("response")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| IngestError::model_call("response lacks a `response` text field"))?;

        tracing::debug!(
            elapsed_ms = %start.elapsed().as_millis(),
            output_len = output.len(),
            "Vision model responded"
        );

        Ok(output.to_string())
    }
}

/// Convert to 8-bit RGB, encode losslessly as PNG, then base64.
pub fn encode_png_base64(image: &DynamicImage) -> Result<String> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| IngestError::model_call(format!("failed to encode PNG: {}", e)))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buffer.into_inner()))
}

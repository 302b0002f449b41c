#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_socket_addr, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MODEL_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MODEL_NAME: &str = "qwen2.5vl";
pub const DEFAULT_SINK_ENDPOINT: &str = "http://localhost:9000/api/v1/sheet_upload";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub sink: SinkConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            model: DEFAULT_MODEL_NAME.to_string(),
            max_output_tokens: 700,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Http,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub endpoint: String,
    pub csv_path: String,
    pub timeout_seconds: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Http,
            endpoint: DEFAULT_SINK_ENDPOINT.to_string(),
            csv_path: "./profiles.csv".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let allowed_origins = ["localhost", "127.0.0.1"]
            .iter()
            .flat_map(|host| {
                [5173, 3000, 5174, 8080]
                    .iter()
                    .map(move |port| format!("http://{}:{}", host, port))
            })
            .collect();

        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            allowed_origins,
        }
    }
}

impl AppConfig {
    /// Load from a TOML file when given, otherwise from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("model.endpoint", &self.model.endpoint)?;
        validate_non_empty_string("model.model", &self.model.model)?;
        validate_range("model.max_output_tokens", self.model.max_output_tokens, 1, 32_768)?;
        validate_range("model.timeout_seconds", self.model.timeout_seconds, 1, 3_600)?;

        match self.sink.kind {
            SinkKind::Http => validate_url("sink.endpoint", &self.sink.endpoint)?,
            SinkKind::Csv => validate_path("sink.csv_path", &self.sink.csv_path)?,
        }
        validate_range("sink.timeout_seconds", self.sink.timeout_seconds, 1, 600)?;

        validate_socket_addr("server.bind_addr", &self.server.bind_addr)?;
        validate_range(
            "server.max_upload_bytes",
            self.server.max_upload_bytes,
            1024,
            512 * 1024 * 1024,
        )?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

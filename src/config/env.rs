use super::{AppConfig, SinkKind};
use crate::utils::error::{IngestError, Result};
use std::str::FromStr;

impl AppConfig {
    /// Defaults overridden by environment variables.
    ///
    /// `OLLAMA_URL`, `VLM_MODEL`, `VLM_MAX_TOKENS`, `VLM_TIMEOUT_SECONDS`,
    /// `MCP_SERVER_URL`, `SINK_KIND`, `SINK_CSV_PATH`, `SINK_TIMEOUT_SECONDS`,
    /// `BIND_ADDR`, `MAX_UPLOAD_BYTES`, `ALLOWED_ORIGINS` (comma separated).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(v) = lookup("OLLAMA_URL") {
            config.model.endpoint = v;
        }
        if let Some(v) = lookup("VLM_MODEL") {
            config.model.model = v;
        }
        if let Some(v) = lookup("VLM_MAX_TOKENS") {
            config.model.max_output_tokens = parse_var("VLM_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("VLM_TIMEOUT_SECONDS") {
            config.model.timeout_seconds = parse_var("VLM_TIMEOUT_SECONDS", &v)?;
        }

        if let Some(v) = lookup("MCP_SERVER_URL") {
            config.sink.endpoint = v;
        }
        if let Some(v) = lookup("SINK_KIND") {
            config.sink.kind = match v.to_ascii_lowercase().as_str() {
                "http" => SinkKind::Http,
                "csv" => SinkKind::Csv,
                _ => {
                    return Err(IngestError::InvalidConfigValueError {
                        field: "SINK_KIND".to_string(),
                        value: v,
                        reason: "expected `http` or `csv`".to_string(),
                    })
                }
            };
        }
        if let Some(v) = lookup("SINK_CSV_PATH") {
            config.sink.csv_path = v;
        }
        if let Some(v) = lookup("SINK_TIMEOUT_SECONDS") {
            config.sink.timeout_seconds = parse_var("SINK_TIMEOUT_SECONDS", &v)?;
        }

        if let Some(v) = lookup("BIND_ADDR") {
            config.server.bind_addr = v;
        }
        if let Some(v) = lookup("MAX_UPLOAD_BYTES") {
            config.server.max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", &v)?;
        }
        if let Some(v) = lookup("ALLOWED_ORIGINS") {
            config.server.allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| IngestError::InvalidConfigValueError {
            field: name.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

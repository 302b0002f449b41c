use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Image decode failed: {0}")]
    DecodeError(#[from] image::ImageError),

    #[error("Model call failed: {message}")]
    ModelCallError { message: String },

    #[error("No structured array found in output: {message}")]
    RecoveryError { message: String },

    #[error("Normalization failed: {message}")]
    NormalizationError { message: String },

    #[error("Sink forwarding failed: {message}")]
    SinkError { message: String },

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl IngestError {
    pub fn model_call(message: impl Into<String>) -> Self {
        Self::ModelCallError {
            message: message.into(),
        }
    }

    pub fn recovery(message: impl Into<String>) -> Self {
        Self::RecoveryError {
            message: message.into(),
        }
    }

    pub fn normalization(message: impl Into<String>) -> Self {
        Self::NormalizationError {
            message: message.into(),
        }
    }

    pub fn sink(message: impl Into<String>) -> Self {
        Self::SinkError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

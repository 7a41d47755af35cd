use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JksError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Jenkins API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Jenkins API error (status {status}) after {retries} retries")]
    ApiErrorAfterRetries { status: u16, retries: u32 },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write output file {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline stage failed: {0}")]
    Stage(#[from] tokio::task::JoinError),

    #[error("Collection cancelled")]
    Cancelled,
}

impl JksError {
    /// Short label used when logging per-item failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::ApiError { .. } | Self::ApiErrorAfterRetries { .. } => {
                "transport"
            }
            Self::Decode { .. } | Self::Json(_) => "decode",
            Self::Config(_) => "config",
            Self::Io(_) | Self::Sink { .. } => "io",
            Self::Stage(_) => "internal",
            Self::Cancelled => "cancelled",
        }
    }
}

pub type Result<T> = std::result::Result<T, JksError>;

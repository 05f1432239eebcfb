//! Error types for the monitor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Insight generation failed: {0}")]
    Generation(String),

    #[error("Timed out after {secs} seconds: {operation}")]
    Timeout { operation: String, secs: u64 },

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// True for failures of an external capability (classifier, generator, transport to them).
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::Classification(_)
                | Self::Generation(_)
                | Self::Timeout { .. }
                | Self::Api(_)
                | Self::Network(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

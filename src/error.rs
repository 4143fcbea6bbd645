// Error types for Canary
// Only the I/O and configuration layer can fail; a line that cannot be
// injected is a skip, never an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanaryError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("worker pool closed: {0}")]
    Pool(#[from] tokio::sync::AcquireError),

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type CanaryResult<T> = Result<T, CanaryError>;

use thiserror::Error;

/// Engine error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Suppression engine and gating check disagree on the minimum cell size
    #[error("Configuration drift: suppression threshold {engine} != gating threshold {gating}")]
    ConfigurationDrift { engine: u64, gating: u64 },
}

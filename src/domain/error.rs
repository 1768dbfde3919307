// Error taxonomy shared by every layer
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VisualizerError {
    /// Conflicting roster initialization.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Bad S/I/R/N values, wrong array length, or a non-numeric time.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// Time index or city outside the known bounds.
    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
}

impl VisualizerError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, VisualizerError>;

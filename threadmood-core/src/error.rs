use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("No document target: {reason}")]
    NoTarget { reason: String },

    #[error("Extraction failed: {reason}")]
    Failed { reason: String },

    #[error("Extraction timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Invalid selector: {selector:?}")]
    InvalidSelector { selector: String },

    #[error("Failed to load page {location}: {reason}")]
    PageLoad { location: String, reason: String },
}

/// Failure of the classification round trip. The display form is the bare
/// message: the response body for HTTP failures, the transport error text
/// otherwise.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("{message}")]
    Transport { message: String },

    #[error("{message}")]
    Status { status_code: u16, message: String },

    #[error("{details}")]
    InvalidResponse { details: String },
}

impl ClassificationError {
    pub fn message(&self) -> &str {
        match self {
            ClassificationError::Transport { message } => message,
            ClassificationError::Status { message, .. } => message,
            ClassificationError::InvalidResponse { details } => details,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClassificationError::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Configuration IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

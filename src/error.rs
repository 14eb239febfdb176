//! Error types for ledgerscan

use std::fmt;

/// Client input rejected before any query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    OverMaxLimit { limit: i64, max: i64 },
    InvalidLimit(i64),
    MalformedParam { name: &'static str, value: String },
    InvalidMessageType(String),
    InvalidTimeRange { start: i64, end: i64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::OverMaxLimit { limit, max } => {
                write!(f, "limit {} is over the maximum of {}", limit, max)
            }
            ValidationError::InvalidLimit(limit) => {
                write!(f, "limit must be positive, got {}", limit)
            }
            ValidationError::MalformedParam { name, value } => {
                write!(f, "parameter '{}' is not an integer: {:?}", name, value)
            }
            ValidationError::InvalidMessageType(ty) => {
                write!(f, "invalid message type: {}", ty)
            }
            ValidationError::InvalidTimeRange { start, end } => {
                write!(f, "startTime {} is after endTime {}", start, end)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExplorerError {
    Validation(ValidationError),
    /// Backing store unreachable or the query failed to execute.
    Storage(String),
    /// A stored row carries nested payloads that do not parse.
    Decode { id: i64, field: &'static str, reason: String },
    ConfigError(String),
    IoError(String),
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExplorerError::Validation(e) => write!(f, "Validation error: {}", e),
            ExplorerError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ExplorerError::Decode { id, field, reason } => {
                write!(f, "Failed to decode {} of record {}: {}", field, id, reason)
            }
            ExplorerError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            ExplorerError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ExplorerError {}

impl From<ValidationError> for ExplorerError {
    fn from(err: ValidationError) -> Self {
        ExplorerError::Validation(err)
    }
}

impl From<rusqlite::Error> for ExplorerError {
    fn from(err: rusqlite::Error) -> Self {
        ExplorerError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        ExplorerError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ExplorerError {
    fn from(err: toml::de::Error) -> Self {
        ExplorerError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Error types for loading customer data and configuration.
///
/// Only the edges of the tool can fail: reading the record snapshot and
/// reading configuration. Parsing and matching a query never produce an
/// error; a query that cannot be interpreted degrades to "no criteria" and a
/// criterion that cannot be evaluated simply does not match.
///
/// ```rust,ignore
/// match CustomerSet::load(path) {
///     Ok(customers) => // Start the session,
///     Err(QueryError::FileNotFound(path)) => // Tell the user where we looked,
///     Err(e) => // Anything else is fatal too
/// }
/// ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for load and configuration operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur before a query session starts
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl QueryError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an IO error on `path` to the most specific variant
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}

impl From<config::ConfigError> for QueryError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

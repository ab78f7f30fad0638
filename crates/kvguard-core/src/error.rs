//! Error types for KVGuard

/// Result type alias using KVGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for KVGuard operations
///
/// Messages carry categories, offsets and counts only. Raw input text and
/// matched values never end up in an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid engine or pattern configuration, fatal at startup
    #[error("configuration error: {0}")]
    Config(String),

    /// Semantic detector failures (transport, status, malformed response)
    #[error("semantic detector error: {0}")]
    Semantic(String),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration parse errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new semantic detector error
    pub fn semantic(msg: impl Into<String>) -> Self {
        Self::Semantic(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short, stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Semantic(_) => "semantic",
            Self::Timeout => "timeout",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Yaml(_) => "yaml",
            Self::Internal(_) => "internal",
        }
    }
}

//! Error types for Galaxy

use thiserror::Error;

/// Result type alias using Galaxy's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Source errors (E100-E199)
    #[error("Source '{source_name}' is unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Invalid source format: {0}")]
    InvalidSourceFormat(String),

    #[error("Network error: {0}. Check that the source endpoint is reachable.")]
    NetworkError(#[from] reqwest::Error),

    // Adapter errors (E200-E299)
    #[error("Adapter '{0}' not found. Run `galaxy adapters list` to see registered adapters.")]
    UnknownAdapter(String),

    #[error("Invalid node record: {0}")]
    InvalidNode(String),

    #[error("Invalid connection record: {0}")]
    InvalidConnection(String),

    // Document errors (E300-E399)
    #[error("Invalid front matter in '{path}': {reason}")]
    FrontMatter { path: String, reason: String },

    // Watch errors (E400-E499)
    #[error("File watch error: {0}")]
    WatchError(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a source-level connectivity failure
    pub fn unavailable(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "E100",
            Self::InvalidSourceFormat(_) => "E101",
            Self::NetworkError(_) => "E102",
            Self::UnknownAdapter(_) => "E200",
            Self::InvalidNode(_) => "E201",
            Self::InvalidConnection(_) => "E202",
            Self::FrontMatter { .. } => "E300",
            Self::WatchError(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Json(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::SourceUnavailable { .. } => {
                Some("galaxy config set sources.root_path <path>".to_string())
            }
            Self::NetworkError(_) => Some("Check the adapter endpoint".to_string()),
            Self::UnknownAdapter(_) => Some("galaxy adapters list".to_string()),
            Self::ConfigError(_) => Some("galaxy config list".to_string()),
            _ => None,
        }
    }

    /// Whether this error came from reaching the source rather than its content
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. } | Self::NetworkError(_))
    }
}

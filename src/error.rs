// Error types - Typed failures for the thermometer client

/// Reasons a saved-history document is refused
#[derive(Debug, thiserror::Error)]
pub enum HistoryFileError {
    #[error("not a saved-history document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading {index}: probe {probe} is not an integer temperature")]
    NonIntegerProbe { index: usize, probe: usize },

    #[error("reading {index}: timestamp is not an integer")]
    NonIntegerTimestamp { index: usize },

    #[error("reading {index}: timestamp is negative")]
    NegativeTimestamp { index: usize },
}

/// Errors that can occur in the client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid history file: {0}")]
    HistoryFile(#[from] HistoryFileError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

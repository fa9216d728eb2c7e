use thiserror::Error;

/// Failure delivering a batch to the ingest endpoint.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned non-success status: {0}")]
    Status(reqwest::StatusCode),
}

/// Failure handling a `POST /api/log` request.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Missing message")]
    MissingMessage,

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Log file write error: {0}")]
    Storage(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

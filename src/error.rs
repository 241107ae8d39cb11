//! Error types for the country lookup and the application binary.

use thiserror::Error;

/// Why a country list could not be obtained.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid country endpoint `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("country request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("country endpoint answered HTTP {0}")]
    Status(u16),

    #[error("country endpoint returned an empty body")]
    EmptyBody,

    #[error("could not decode country list: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Top-level failures of the `todo` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

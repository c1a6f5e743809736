use thiserror::Error;

/// Failure of the underlying fetch primitive.
///
/// These are passed through to the caller untouched; the inspector only
/// records them as failed entries.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request aborted: {0}")]
    Aborted(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_entries: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    #[error("Invalid backend domain: {0:?}")]
    InvalidBackendDomain(String),

    #[error("Invalid HTTP method in request list: {0}")]
    InvalidMethod(String),
}

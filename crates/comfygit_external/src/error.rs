use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned unexpected status {status}")]
    UnexpectedStatus { url: String, status: reqwest::StatusCode },

    #[error("no candidate found for `{0}`")]
    NotFound(String),

    #[error("failed to read or write cache entry at {path}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed response body from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{0}` is not a recognized VCS host URL")]
    UnsupportedHost(String),
}

pub type ExternalResult<T> = Result<T, ExternalError>;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {message} (at byte offset {offset})")]
    Parse {
        path: PathBuf,
        message: String,
        offset: usize,
    },

    #[error("malformed `[{table}]` table: {message}")]
    Schema { table: String, message: String },

    #[error("unknown node package `{0}`")]
    UnknownNode(String),

    #[error("unknown workflow `{0}`")]
    UnknownWorkflow(String),

    #[error("unknown model `{hash}` in category `{category}`")]
    UnknownModel { category: String, hash: String },
}

pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

impl From<toml_edit::TomlError> for ManifestError {
    fn from(e: toml_edit::TomlError) -> Self {
        let offset = e.span().map(|s| s.start).unwrap_or(0);
        ManifestError::Parse {
            path: PathBuf::new(),
            message: e.message().to_string(),
            offset,
        }
    }
}

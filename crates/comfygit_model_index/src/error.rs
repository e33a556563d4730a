use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelIndexError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error at `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{path}` is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("unsupported schema version {found}, expected at most {max_known}")]
    UnsupportedSchema { found: u32, max_known: u32 },
}

pub type ModelIndexResult<T> = std::result::Result<T, ModelIndexError>;

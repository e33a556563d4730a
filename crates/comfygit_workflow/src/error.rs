use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("invalid workflow JSON at byte {offset}: {message}")]
    InvalidJson { offset: usize, message: String },

    #[error("workflow document has no top-level `nodes` array")]
    MissingNodes,

    #[error("io error at `{path}`: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serde_json error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("manifest error: {0}")]
    Manifest(#[from] comfygit_manifest::ManifestError),

    #[error("model index error: {0}")]
    ModelIndex(#[from] comfygit_model_index::ModelIndexError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serde_json error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("registry cache unavailable: {0}")]
    RegistryUnavailable(String),
}

pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;

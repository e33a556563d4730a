//! The workspace-wide model catalog: a SQLite database that maps content
//! hashes to the physical locations holding that content, so models can be
//! shared across environments without duplication and re-discovered after a
//! manual move or rename.

mod db;
mod error;
mod hash;
mod model_index;
mod types;

pub use error::{ModelIndexError, ModelIndexResult};
pub use hash::{blake3_hash_file, quick_hash_file, sha256_hash_file, QuickHash};
pub use model_index::{ModelIndex, SyncReport};
pub use types::{category_of, IndexStats, IndexedModel, ModelLocation, ModelSource};

//! Thin, replaceable clients for the three kinds of external source the
//! reconciler touches: the node registry, VCS hosts, and model/archive
//! download sources. Nothing here is required by the core resolution or
//! reconciliation logic — each is consumed through a trait defined by its
//! caller crate, so a test or offline build can swap in a stub.

mod api_cache;
mod download;
mod error;
mod registry;
mod vcs;

pub use api_cache::ApiCache;
pub use download::{DownloadSource, HttpDownloadSource};
pub use error::{ExternalError, ExternalResult};
pub use registry::{CachedRegistryLookup, HttpRegistryClient, RegistryClient};
pub use vcs::{normalize_remote, parse_remote_url, same_repository, GitHubClient, ResolvedRef, VcsHostClient};

//! Bridges the core's synchronous install pipeline to `comfygit_external`'s
//! async VCS/registry/download clients, the same blocking-runtime pattern
//! `comfygit_external::registry::CachedRegistryLookup` uses for the
//! resolution engine.

use std::path::Path;

use comfygit_external::{DownloadSource, RegistryClient, ResolvedRef, VcsHostClient};

use crate::error::{NodeError, NodeResult};

pub trait NodeAcquisitionSource {
    fn resolve_ref(&self, repo_url: &str, reference: Option<&str>) -> NodeResult<ResolvedRef>;
    fn registry_archive_url(&self, package_id: &str, reference: &str) -> NodeResult<Option<String>>;
    fn download_archive(&self, url: &str, dest: &Path) -> NodeResult<()>;
}

impl<T: NodeAcquisitionSource + ?Sized> NodeAcquisitionSource for &T {
    fn resolve_ref(&self, repo_url: &str, reference: Option<&str>) -> NodeResult<ResolvedRef> {
        (**self).resolve_ref(repo_url, reference)
    }

    fn registry_archive_url(&self, package_id: &str, reference: &str) -> NodeResult<Option<String>> {
        (**self).registry_archive_url(package_id, reference)
    }

    fn download_archive(&self, url: &str, dest: &Path) -> NodeResult<()> {
        (**self).download_archive(url, dest)
    }
}

pub struct ExternalAcquisitionSource<V, R, D> {
    vcs: V,
    registry: R,
    downloader: D,
    runtime: tokio::runtime::Runtime,
}

impl<V: VcsHostClient, R: RegistryClient, D: DownloadSource> ExternalAcquisitionSource<V, R, D> {
    pub fn new(vcs: V, registry: R, downloader: D) -> NodeResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(NodeError::Io)?;
        Ok(Self { vcs, registry, downloader, runtime })
    }
}

impl<V: VcsHostClient, R: RegistryClient, D: DownloadSource> NodeAcquisitionSource for ExternalAcquisitionSource<V, R, D> {
    fn resolve_ref(&self, repo_url: &str, reference: Option<&str>) -> NodeResult<ResolvedRef> {
        Ok(self.runtime.block_on(self.vcs.resolve_ref(repo_url, reference))?)
    }

    fn registry_archive_url(&self, package_id: &str, reference: &str) -> NodeResult<Option<String>> {
        Ok(self.runtime.block_on(self.registry.archive_url(package_id, reference))?)
    }

    fn download_archive(&self, url: &str, dest: &Path) -> NodeResult<()> {
        self.runtime.block_on(self.downloader.fetch_to(url, dest))?;
        Ok(())
    }
}

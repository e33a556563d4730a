//! Builds the collaborators every command needs: the workspace handle, the
//! model index, and the concrete network-backed adapters for node and model
//! acquisition. One place to construct them keeps every command function a
//! thin call into the core crates rather than its own wiring exercise.

use comfygit_external::{CachedRegistryLookup, GitHubClient, HttpDownloadSource, HttpRegistryClient};
use comfygit_model_index::ModelIndex;
use comfygit_nodes::{ArchiveCache, ExternalAcquisitionSource, NoopResolutionTester};
use comfygit_python::PythonBroker;
use comfygit_reconcile::BlockingDownloader;
use comfygit_workspace::{Environment, Workspace};

use crate::error::CliResult;

pub type Acquisition = ExternalAcquisitionSource<GitHubClient, HttpRegistryClient, HttpDownloadSource>;
pub type Downloader = BlockingDownloader<HttpDownloadSource>;
pub type Registry = CachedRegistryLookup<HttpRegistryClient>;

pub struct Context {
    pub workspace: Workspace,
    pub model_index: ModelIndex,
}

impl Context {
    pub fn discover() -> CliResult<Self> {
        let workspace = Workspace::discover()?;
        let model_index = ModelIndex::open(&workspace.paths().model_index_db(), workspace.paths().default_models_pool())?;
        Ok(Self { workspace, model_index })
    }

    pub fn environment(&self, name: Option<&str>) -> CliResult<Environment> {
        Ok(self.workspace.resolve_environment(name)?)
    }

    pub fn acquisition(&self) -> CliResult<Acquisition> {
        let http = reqwest::Client::new();
        let vcs = GitHubClient::new(http.clone());
        let registry = HttpRegistryClient::new(http.clone(), &self.workspace.paths().api_cache_dir());
        let downloader = HttpDownloadSource::new(http);
        Ok(Acquisition::new(vcs, registry, downloader)?)
    }

    pub fn downloader(&self) -> CliResult<Downloader> {
        Ok(Downloader::new(HttpDownloadSource::new(reqwest::Client::new()))?)
    }

    pub fn registry(&self) -> CliResult<Registry> {
        let http = reqwest::Client::new();
        let client = HttpRegistryClient::new(http, &self.workspace.paths().api_cache_dir());
        Ok(Registry::new(client)?)
    }

    pub fn archive_cache(&self) -> ArchiveCache {
        ArchiveCache::new(self.workspace.paths().node_cache_dir())
    }

    pub fn tester(&self) -> NoopResolutionTester {
        NoopResolutionTester
    }

    pub fn broker(&self, env: &Environment) -> PythonBroker {
        PythonBroker::new(env.paths().root())
    }
}

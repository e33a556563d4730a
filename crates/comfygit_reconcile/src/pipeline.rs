//! The reconciliation pipeline (§4.8): runs the six steps in the declared
//! order — model symlink, node delta, Python sync, workflow tracking,
//! workflow restoration, model acquisition — on every creation, pull,
//! rollback, import, and explicit sync. Workflow tracking runs before
//! restoration: it analyzes and resolves any ComfyUI-side workflow the
//! manifest doesn't know about yet and copies it into the committed
//! directory, so restoration's delete-untracked-files pass doesn't discard
//! it. Each step is idempotent; only the model symlink and node
//! reconciliation steps can hard-fail the whole pass (a symlink that cannot
//! be established, or every node mutation failing).

use std::path::Path;

use comfygit_external::DownloadSource;
use comfygit_manifest::Manifest;
use comfygit_model_index::ModelIndex;
use comfygit_nodes::{ArchiveCache, NodeAcquisitionSource, PythonResolutionTester};
use comfygit_python::PythonBroker;
use comfygit_resolution::NodeRegistryLookup;
use comfygit_workflow::{mirror_workflows, MirrorOutcome};
use comfygit_workspace::{EnvironmentPaths, ModelLink};

use crate::error::ReconcileResult;
use crate::models::{acquire_models, BlockingDownloader, ModelAcquisitionReport, ModelAcquisitionStrategy};
use crate::nodes::{reconcile_nodes, NodeReconcileReport};
use crate::workflows::{track_workflows, WorkflowTrackingReport};

#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub nodes: NodeReconcileReport,
    pub python_synced: bool,
    pub workflows_tracked: WorkflowTrackingReport,
    pub workflows: MirrorOutcome,
    pub models: Option<ModelAcquisitionReport>,
}

/// `model_strategy: Skip` (the default for creation/rollback/explicit sync,
/// per §4.8's "only on pull/import") keeps step 5 a no-op.
#[allow(clippy::too_many_arguments)]
pub fn reconcile<A: NodeAcquisitionSource, D: DownloadSource>(
    manifest: &mut Manifest,
    env_paths: &EnvironmentPaths,
    models_pool_dir: &Path,
    acquisition: &A,
    archive_cache: ArchiveCache,
    broker: &PythonBroker,
    tester: &dyn PythonResolutionTester,
    model_index: &ModelIndex,
    downloader: &BlockingDownloader<D>,
    registry: &dyn NodeRegistryLookup,
    model_strategy: ModelAcquisitionStrategy,
) -> ReconcileResult<ReconcileReport> {
    let model_link = ModelLink::new(env_paths.models_link(), models_pool_dir);
    model_link.create()?;

    let nodes = reconcile_nodes(manifest, &env_paths.custom_nodes_dir(), archive_cache, acquisition, tester)?;

    broker.sync()?;

    let workflows_tracked = track_workflows(
        manifest,
        &env_paths.comfyui_workflows_dir(),
        &env_paths.workflows_mirror_dir(),
        model_index,
        registry,
    )?;

    let workflows = mirror_workflows(&env_paths.workflows_mirror_dir(), &env_paths.comfyui_workflows_dir())?;

    let models = if model_strategy == ModelAcquisitionStrategy::Skip {
        None
    } else {
        Some(acquire_models(manifest, models_pool_dir, model_index, downloader, model_strategy)?)
    };

    Ok(ReconcileReport { nodes, python_synced: true, workflows_tracked, workflows, models })
}

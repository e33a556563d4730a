//! Model acquisition (§4.8 step 5, pull/import only): downloads every
//! `status=unresolved` workflow model entry that carries at least one source
//! URL, under the selected strategy. Failures preserve the download intent
//! (the entry just stays unresolved) rather than aborting the pass.

use std::path::Path;

use comfygit_external::DownloadSource;
use comfygit_manifest::{Manifest, ModelCriticality, ModelResolutionStatus};
use comfygit_model_index::ModelIndex;

use crate::error::{ReconcileError, ReconcileResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAcquisitionStrategy {
    All,
    Required,
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct ModelAcquisitionReport {
    pub downloaded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Bridges the reconciler's synchronous pipeline to `comfygit_external`'s
/// async `DownloadSource`, the same blocking-runtime bridge
/// `comfygit_nodes::acquisition::ExternalAcquisitionSource` uses for archive
/// downloads.
pub struct BlockingDownloader<D> {
    inner: D,
    runtime: tokio::runtime::Runtime,
}

impl<D: DownloadSource> BlockingDownloader<D> {
    pub fn new(inner: D) -> ReconcileResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        Ok(Self { inner, runtime })
    }

    pub fn fetch_to(&self, url: &str, dest: &Path) -> ReconcileResult<u64> {
        Ok(self.runtime.block_on(self.inner.fetch_to(url, dest))?)
    }
}

pub fn acquire_models<D: DownloadSource>(
    manifest: &mut Manifest,
    models_dir: &Path,
    model_index: &ModelIndex,
    downloader: &BlockingDownloader<D>,
    strategy: ModelAcquisitionStrategy,
) -> ReconcileResult<ModelAcquisitionReport> {
    let mut report = ModelAcquisitionReport::default();
    if strategy == ModelAcquisitionStrategy::Skip {
        return Ok(report);
    }

    for workflow_name in manifest.list_workflow_names() {
        let Some(mut workflow) = manifest.get_workflow(&workflow_name) else { continue };
        let mut touched_indices = Vec::new();

        for (index, model_entry) in workflow.models.iter_mut().enumerate() {
            if model_entry.status != ModelResolutionStatus::Unresolved {
                continue;
            }
            if strategy == ModelAcquisitionStrategy::Required && model_entry.criticality != ModelCriticality::Required {
                continue;
            }
            let Some(source) = model_entry.sources.first().cloned() else { continue };

            let dest = models_dir.join(&model_entry.category).join(&model_entry.filename);
            let label = format!("{workflow_name}/{}", model_entry.filename);
            match downloader.fetch_to(&source.url, &dest) {
                Ok(_) => {
                    model_entry.status = ModelResolutionStatus::Resolved;
                    touched_indices.push(index);
                    report.downloaded.push(label);
                }
                Err(err) => {
                    tracing::warn!(model = label, error = %err, "model download failed, intent preserved");
                    report.failed.push((label, err.to_string()));
                }
            }
        }

        for index in touched_indices {
            manifest.upsert_workflow_model(&workflow_name, &workflow.models[index]);
        }
    }

    if !report.downloaded.is_empty() {
        model_index.sync(false)?;
    }

    Ok(report)
}

//! PyTorch backend strip-and-reinstall (§4.6): switching or declaring a
//! backend label drops any previously pinned torch source/index, installs
//! the target distribution from that backend's wheel index, reads back the
//! concrete installed version, and writes both back into the manifest.

use comfygit_manifest::Manifest;

use crate::broker::PythonBroker;
use crate::error::PythonResult;
use crate::uv_ops;

const TORCH_WHEEL_INDEX_BASE: &str = "https://download.pytorch.org/whl";

pub fn index_url_for_backend(backend: &str) -> String {
    format!("{TORCH_WHEEL_INDEX_BASE}/{backend}")
}

/// Reinstalls `torch` for `backend` (e.g. `cu128`, `cpu`, `rocm6.3`, `xpu`)
/// and writes the resolved version and index URL back into the manifest.
/// This is the same operation import performs on cross-platform transfer.
pub fn reinstall_torch(broker: &PythonBroker, manifest: &mut Manifest, backend: &str) -> PythonResult<()> {
    manifest.strip_torch_install_state();

    let index_url = index_url_for_backend(backend);
    uv_ops::run(
        &broker.project_dir(),
        &broker.venv_dir(),
        &["pip", "install", "torch", "--index-url", &index_url, "--reinstall"],
    )?;

    let torch_version = broker.installed_version("torch")?;
    let mut config = manifest.environment_config();
    config.torch_backend = Some(backend.to_string());
    config.torch_version = torch_version;
    config.torch_index_url = Some(index_url);
    manifest.set_environment_config(&config);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_url_is_backend_specific() {
        assert_eq!(index_url_for_backend("cu128"), "https://download.pytorch.org/whl/cu128");
        assert_eq!(index_url_for_backend("rocm6.3"), "https://download.pytorch.org/whl/rocm6.3");
    }
}

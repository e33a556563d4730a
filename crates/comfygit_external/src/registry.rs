//! Registry client: looks up which packages implement a given custom node
//! class name (§4.4 step 2's "workspace-cached table"), backed by the
//! ComfyUI registry's node-type search endpoint.

use std::time::Duration;

use comfygit_resolution::NodeRegistryLookup;
use serde::Deserialize;

use crate::api_cache::ApiCache;
use crate::error::{ExternalError, ExternalResult};

const DEFAULT_REGISTRY_BASE_URL: &str = "https://api.comfy.org";
const CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Deserialize)]
struct NodeTypeSearchResponse {
    #[serde(default)]
    nodes: Vec<RegistryNodeHit>,
}

#[derive(Debug, Clone, Deserialize)]
struct RegistryNodeHit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct VersionInfoResponse {
    download_url: Option<String>,
}

#[async_trait::async_trait]
pub trait RegistryClient: Send + Sync {
    /// All package ids that register a given node class name.
    async fn candidates_for_node_type(&self, node_type: &str) -> ExternalResult<Vec<String>>;

    /// Archive download URL for a package at a specific version, if the
    /// registry publishes one (§4.5 step 3's "fetch an archive for registry
    /// packages when available").
    async fn archive_url(&self, package_id: &str, reference: &str) -> ExternalResult<Option<String>>;
}

pub struct HttpRegistryClient {
    http: reqwest::Client,
    base_url: String,
    cache: ApiCache,
}

impl HttpRegistryClient {
    pub fn new(http: reqwest::Client, cache_root: &std::path::Path) -> Self {
        Self { http, base_url: DEFAULT_REGISTRY_BASE_URL.to_string(), cache: ApiCache::new(cache_root) }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn candidates_for_node_type(&self, node_type: &str) -> ExternalResult<Vec<String>> {
        let cache_key = format!("{}/nodes/search?comfy_node_type={}", self.base_url, node_type);
        if let Some(ids) = self.cache.get::<Vec<String>>(&cache_key, CACHE_TTL) {
            return Ok(ids);
        }

        let url = format!("{}/nodes/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("comfy_node_type", node_type)])
            .send()
            .await
            .map_err(|source| ExternalError::Http { url: url.clone(), source })?;

        if !response.status().is_success() {
            return Err(ExternalError::UnexpectedStatus { url, status: response.status() });
        }

        let body: NodeTypeSearchResponse = response
            .json()
            .await
            .map_err(|source| ExternalError::Http { url: url.clone(), source })?;
        let ids: Vec<String> = body.nodes.into_iter().map(|n| n.id).collect();

        self.cache.put(&cache_key, &ids).ok();
        Ok(ids)
    }

    async fn archive_url(&self, package_id: &str, reference: &str) -> ExternalResult<Option<String>> {
        let cache_key = format!("{}/nodes/{package_id}/versions/{reference}", self.base_url);
        if let Some(url) = self.cache.get::<Option<String>>(&cache_key, CACHE_TTL) {
            return Ok(url);
        }

        let url = format!("{}/nodes/{package_id}/versions/{reference}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ExternalError::Http { url: url.clone(), source })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ExternalError::UnexpectedStatus { url, status: response.status() });
        }

        let body: VersionInfoResponse = response
            .json()
            .await
            .map_err(|source| ExternalError::Http { url: url.clone(), source })?;

        self.cache.put(&cache_key, &body.download_url).ok();
        Ok(body.download_url)
    }
}

/// Adapts an async [`RegistryClient`] to the synchronous
/// [`NodeRegistryLookup`] the resolution engine consumes, by blocking on a
/// dedicated runtime. A failed or unreachable registry degrades to an empty
/// candidate list rather than propagating, per §4.4's "missing registry
/// cache is a recoverable error" failure semantics.
pub struct CachedRegistryLookup<C: RegistryClient> {
    client: C,
    runtime: tokio::runtime::Runtime,
}

impl<C: RegistryClient> CachedRegistryLookup<C> {
    pub fn new(client: C) -> ExternalResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| ExternalError::Cache { path: std::path::PathBuf::new(), source })?;
        Ok(Self { client, runtime })
    }
}

impl<C: RegistryClient> NodeRegistryLookup for CachedRegistryLookup<C> {
    fn candidates_for(&self, node_type: &str) -> Vec<String> {
        match self.runtime.block_on(self.client.candidates_for_node_type(node_type)) {
            Ok(ids) => ids,
            Err(err) => {
                tracing::warn!(node_type, error = %err, "registry lookup failed; treating as zero candidates");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClient(Vec<String>);

    #[async_trait::async_trait]
    impl RegistryClient for FixedClient {
        async fn candidates_for_node_type(&self, _node_type: &str) -> ExternalResult<Vec<String>> {
            Ok(self.0.clone())
        }

        async fn archive_url(&self, _package_id: &str, _reference: &str) -> ExternalResult<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn adapter_surfaces_client_candidates_synchronously() {
        let lookup = CachedRegistryLookup::new(FixedClient(vec!["comfyui-impact-pack".into()])).unwrap();
        assert_eq!(lookup.candidates_for("ImpactPack"), vec!["comfyui-impact-pack".to_string()]);
    }

    struct FailingClient;

    #[async_trait::async_trait]
    impl RegistryClient for FailingClient {
        async fn candidates_for_node_type(&self, node_type: &str) -> ExternalResult<Vec<String>> {
            Err(ExternalError::NotFound(node_type.to_string()))
        }

        async fn archive_url(&self, package_id: &str, _reference: &str) -> ExternalResult<Option<String>> {
            Err(ExternalError::NotFound(package_id.to_string()))
        }
    }

    #[test]
    fn adapter_degrades_to_empty_on_failure() {
        let lookup = CachedRegistryLookup::new(FailingClient).unwrap();
        assert!(lookup.candidates_for("Anything").is_empty());
    }
}

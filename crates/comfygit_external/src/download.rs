//! Download sources: streams a URL to a destination path for node archive
//! acquisition (§4.5 step 3) and model acquisition (§4.8 step 5). Downgrades
//! HTTP failures to a recoverable error rather than panicking, so the
//! reconciler can preserve a download intent instead of aborting (§7
//! "download adapter downgrades HTTP failures").

use std::path::Path;

use futures::StreamExt;

use crate::error::{ExternalError, ExternalResult};

const CIVITAI_API_KEY_ENV: &str = "CIVITAI_API_KEY";

#[async_trait::async_trait]
pub trait DownloadSource: Send + Sync {
    async fn fetch_to(&self, url: &str, dest: &Path) -> ExternalResult<u64>;
}

pub struct HttpDownloadSource {
    http: reqwest::Client,
}

impl HttpDownloadSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.get(url);
        if url.contains("civitai.com") {
            if let Ok(key) = std::env::var(CIVITAI_API_KEY_ENV) {
                builder = builder.bearer_auth(key);
            }
        }
        builder
    }
}

#[async_trait::async_trait]
impl DownloadSource for HttpDownloadSource {
    async fn fetch_to(&self, url: &str, dest: &Path) -> ExternalResult<u64> {
        let response = self
            .request(url)
            .send()
            .await
            .map_err(|source| ExternalError::Http { url: url.to_string(), source })?;

        if !response.status().is_success() {
            return Err(ExternalError::UnexpectedStatus { url: url.to_string(), status: response.status() });
        }

        if let Some(parent) = dest.parent() {
            fs_err::create_dir_all(parent).map_err(|source| ExternalError::Cache { path: parent.to_path_buf(), source })?;
        }

        let mut file = fs_err::tokio::File::create(dest)
            .await
            .map_err(|source| ExternalError::Cache { path: dest.to_path_buf(), source })?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        use tokio::io::AsyncWriteExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| ExternalError::Http { url: url.to_string(), source })?;
            file.write_all(&chunk)
                .await
                .map_err(|source| ExternalError::Cache { path: dest.to_path_buf(), source })?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civitai_url_picks_up_bearer_token_when_env_set() {
        std::env::set_var(CIVITAI_API_KEY_ENV, "test-token");
        let source = HttpDownloadSource::new(reqwest::Client::new());
        let request = source.request("https://civitai.com/api/download/models/123").build().unwrap();
        assert!(request.headers().contains_key(reqwest::header::AUTHORIZATION));
        std::env::remove_var(CIVITAI_API_KEY_ENV);
    }

    #[test]
    fn non_civitai_url_has_no_auth_header() {
        let source = HttpDownloadSource::new(reqwest::Client::new());
        let request = source.request("https://huggingface.co/foo/bar/resolve/main/model.safetensors").build().unwrap();
        assert!(!request.headers().contains_key(reqwest::header::AUTHORIZATION));
    }
}

//! Disk cache for external API responses, one JSON file per request key under
//! `<cache>/api_cache/`, so a missing network connection degrades to stale
//! data instead of a hard failure.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ExternalError, ExternalResult};

pub struct ApiCache {
    dir: PathBuf,
}

impl ApiCache {
    pub fn new(cache_root: &Path) -> Self {
        Self { dir: cache_root.join("api_cache") }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Option<T> {
        let path = self.path_for(key);
        let metadata = fs_err::metadata(&path).ok()?;
        let modified = metadata.modified().ok()?;
        if SystemTime::now().duration_since(modified).unwrap_or(Duration::MAX) > max_age {
            return None;
        }
        let contents = fs_err::read_to_string(&path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> ExternalResult<()> {
        fs_err::create_dir_all(&self.dir).map_err(|source| ExternalError::Cache { path: self.dir.clone(), source })?;
        let path = self.path_for(key);
        let body = serde_json::to_string_pretty(value)
            .map_err(|source| ExternalError::Decode { url: key.to_string(), source })?;
        fs_err::write(&path, body).map_err(|source| ExternalError::Cache { path, source })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();
        self.dir.join(format!("{:x}.json", digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ApiCache::new(dir.path());
        cache.put("https://registry.example/pkg", &vec!["a".to_string(), "b".to_string()]).unwrap();
        let value: Vec<String> = cache.get("https://registry.example/pkg", Duration::from_secs(3600)).unwrap();
        assert_eq!(value, vec!["a", "b"]);
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ApiCache::new(dir.path());
        cache.put("key", &42).unwrap();
        let value: Option<i32> = cache.get("key", Duration::from_secs(0));
        assert!(value.is_none());
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ApiCache::new(dir.path());
        let value: Option<i32> = cache.get("absent", Duration::from_secs(60));
        assert!(value.is_none());
    }
}

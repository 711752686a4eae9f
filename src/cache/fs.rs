//! Directory-backed cache store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::trace;

use super::{clamp_percent, CacheStore};
use crate::error::{Error, Result};

/// Treats every regular file under `root` as a cache entry and measures the
/// total against a byte quota.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
    quota_bytes: u64,
}

impl FsCacheStore {
    pub fn new(root: impl Into<PathBuf>, quota_bytes: u64) -> Self {
        Self {
            root: root.into(),
            quota_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    async fn total_bytes(&self) -> Result<u64> {
        let mut total = 0u64;
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // The root may not exist until the first entry is written.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::CacheQuery(format!(
                        "failed to read {}: {}",
                        dir.display(),
                        e
                    )))
                }
            };

            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    total += entry.metadata().await?.len();
                }
            }
        }

        trace!(root = %self.root.display(), total, "Measured cache directory");
        Ok(total)
    }
}

#[async_trait::async_trait]
impl CacheStore for FsCacheStore {
    async fn cache_size(&self) -> Result<u64> {
        self.total_bytes().await
    }

    async fn usage_percent(&self) -> Result<f64> {
        if self.quota_bytes == 0 {
            return Ok(0.0);
        }
        let used = self.total_bytes().await?;
        Ok(clamp_percent(used as f64 / self.quota_bytes as f64 * 100.0))
    }
}

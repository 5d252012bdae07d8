use anyhow::Context;
use async_trait::async_trait;
use nimbus_core::{PayloadReader, ProviderName};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::provider::Uploader;

/// Filesystem-based uploader for dry runs and local testing.
///
/// Buckets are directories under `base_path`, created on first use.
pub struct LocalUploader {
    base_path: PathBuf,
    name: ProviderName,
}

impl LocalUploader {
    pub fn new(base_path: &Path, name: impl Into<ProviderName>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(base_path)
            .with_context(|| format!("creating {}", base_path.display()))?;
        Ok(Self {
            base_path: base_path.to_path_buf(),
            name: name.into(),
        })
    }

    /// Where `bucket/key` lands on disk. Rejects names that would escape `base_path`.
    pub fn object_path(&self, bucket: &str, key: &str) -> anyhow::Result<PathBuf> {
        check_segment("bucket", bucket)?;
        let key_path = Path::new(key);
        if key.is_empty()
            || !key_path
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("invalid key: {key:?}");
        }
        Ok(self.base_path.join(bucket).join(key_path))
    }
}

fn check_segment(what: &str, value: &str) -> anyhow::Result<()> {
    if value.is_empty() || value.contains(['/', '\\']) || value == "." || value == ".." {
        anyhow::bail!("invalid {what}: {value:?}");
    }
    Ok(())
}

#[async_trait]
impl Uploader for LocalUploader {
    async fn upload(&self, bucket: &str, key: &str, payload: PayloadReader) -> anyhow::Result<()> {
        let path = self.object_path(bucket, key)?;
        let parent = path
            .parent()
            .with_context(|| format!("{} has no parent directory", path.display()))?;
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;

        // Uniquely named sibling, removed on drop unless persisted.
        let (file, tmp_path) = tempfile::Builder::new()
            .prefix(".nimbus-")
            .suffix(".part")
            .tempfile_in(parent)
            .with_context(|| format!("creating temp file in {}", parent.display()))?
            .into_parts();

        let mut file = tokio::fs::File::from_std(file);
        file.write_all(&payload.into_bytes())
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("syncing {}", tmp_path.display()))?;
        drop(file);

        tmp_path
            .persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("renaming into {}", path.display()))?;

        tracing::debug!(path = %path.display(), "object written");
        Ok(())
    }

    fn provider(&self) -> &ProviderName {
        &self.name
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::FeedPublisher;

/// Writes `<dir>/<feed_id>.xml`, replacing it via rename.
pub struct FsPublisher {
    dir: PathBuf,
}

impl FsPublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, feed_id: &str) -> PathBuf {
        self.dir.join(format!("{feed_id}.xml"))
    }
}

#[async_trait]
impl FeedPublisher for FsPublisher {
    async fn save(&self, feed_id: &str, document: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let target = self.path_for(feed_id);
        let tmp = self.dir.join(format!(".{feed_id}.xml.tmp"));
        tokio::fs::write(&tmp, document)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &target)
            .await
            .with_context(|| format!("failed to move feed into {}", target.display()))?;
        Ok(())
    }
}

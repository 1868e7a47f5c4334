use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::util::shell::{fill_template, run_shell};

use super::Downloader;

const AUDIO_EXT: &str = "mp3";

/// Runs an external download tool. `{id}` is the item id and `{file}` the
/// target path under `dest_dir`; the tool must leave the file there.
pub struct CommandDownloader {
    template: String,
    dest_dir: PathBuf,
}

impl CommandDownloader {
    pub fn new(template: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
        Self { template: template.into(), dest_dir: dest_dir.into() }
    }

    fn target(&self, file_name: &str) -> PathBuf {
        self.dest_dir.join(format!("{file_name}.{AUDIO_EXT}"))
    }
}

#[async_trait]
impl Downloader for CommandDownloader {
    async fn fetch(&self, item_id: &str, file_name: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.dest_dir)
            .await
            .with_context(|| format!("failed to create {}", self.dest_dir.display()))?;
        let target = self.target(file_name);
        let target_str = target.to_string_lossy().into_owned();
        let cmd = fill_template(&self.template, &[("id", item_id), ("file", &target_str)]);
        run_shell(&cmd).await.with_context(|| format!("download of {item_id} failed"))?;
        tokio::fs::metadata(&target)
            .await
            .with_context(|| format!("download of {item_id} left no file at {target_str}"))?;
        Ok(target_str)
    }
}

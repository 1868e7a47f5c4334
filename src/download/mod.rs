use anyhow::Result;
use async_trait::async_trait;

mod command;

pub use command::CommandDownloader;

/// Fetches the audio of one item into a file named after `file_name`.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the local path of the downloaded file.
    async fn fetch(&self, item_id: &str, file_name: &str) -> Result<String>;
}

use anyhow::Result;
use async_trait::async_trait;

mod fs;

pub use fs::FsPublisher;

/// Stores a rendered feed document where it is served from.
#[async_trait]
pub trait FeedPublisher: Send + Sync {
    async fn save(&self, feed_id: &str, document: &str) -> Result<()>;
}

use anyhow::Result;
use async_trait::async_trait;

use crate::config::FeedKind;
use crate::entry::Entry;

mod command;

pub use command::CommandLister;

/// Lists the current entries of a channel or playlist, newest first.
#[async_trait]
pub trait ChannelLister: Send + Sync {
    async fn list(&self, feed_id: &str, kind: FeedKind) -> Result<Vec<Entry>>;
}

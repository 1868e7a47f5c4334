use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::FeedKind;
use crate::entry::Entry;
use crate::util::shell::{fill_template, run_shell};

use super::ChannelLister;

/// Runs an external listing tool. `{id}` and `{type}` are substituted and
/// the tool must print a JSON array of entries on stdout.
pub struct CommandLister {
    template: String,
}

impl CommandLister {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }
}

#[async_trait]
impl ChannelLister for CommandLister {
    async fn list(&self, feed_id: &str, kind: FeedKind) -> Result<Vec<Entry>> {
        let cmd = fill_template(&self.template, &[("id", feed_id), ("type", kind.as_str())]);
        let stdout = run_shell(&cmd).await?;
        parse_listing(&stdout, feed_id).with_context(|| format!("unexpected listing output for {feed_id}"))
    }
}

/// Entries are keyed by the feed they were listed for, whatever channel the
/// tool reports (playlist items carry their uploader's channel).
pub(crate) fn parse_listing(raw: &[u8], feed_id: &str) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = serde_json::from_slice(raw)?;
    for e in entries.iter_mut() {
        e.channel_id = feed_id.to_string();
        // a listing never carries local files
        e.file.clear();
    }
    Ok(entries)
}

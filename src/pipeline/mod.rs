//! The poll → dedup → retain → publish loop.
//!
//! One tick walks every configured feed in order: list its entries, skip the
//! ones already handled, download the new ones, persist them, then trim the
//! channel and republish its feed document if anything was added.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::Instrument;

use crate::config::{effective_keep, FeedInfo};
use crate::download::Downloader;
use crate::publish::FeedPublisher;
use crate::scheduler::PeriodicJob;
use crate::source::ChannelLister;
use crate::store::EntryStore;
use crate::telemetry::{self};
use crate::telemetry::ops::poll::Phase as PollPhase;

pub mod classify;
pub mod process;
pub mod render;
pub mod stats;
pub mod trim;

use stats::RunStats;

/// Everything a tick needs; collaborators are injected.
pub struct Service {
    pub feeds: Vec<FeedInfo>,
    pub lister: Arc<dyn ChannelLister>,
    pub downloader: Arc<dyn Downloader>,
    pub store: Arc<dyn EntryStore>,
    pub publisher: Arc<dyn FeedPublisher>,
    /// Global default retention.
    pub keep_per_channel: usize,
    /// Root for enclosure URLs.
    pub root_url: String,
}

impl Service {
    pub fn keep(&self, feed: &FeedInfo) -> usize {
        effective_keep(feed, self.keep_per_channel)
    }

    /// One full pass over all feeds. Only a failure to persist a new entry
    /// aborts the pass.
    pub async fn process_channels(&self) -> Result<RunStats> {
        let log = telemetry::poll();
        let mut all = RunStats::default();

        for feed in &self.feeds {
            let span = log.span_kv(&PollPhase::Channel, [("id", feed.id.clone()), ("name", feed.name.clone())]);
            let outcome = self.process_channel(feed).instrument(span).await?;
            all += outcome.stats;
        }

        let lifetime = self.store.count_processed().await;
        log.totals(self.feeds.len(), &all, lifetime);

        match self.store.most_recent().await {
            Ok(Some(last)) => log.info(format!("last entry: {last}")),
            Ok(None) => {}
            Err(e) => log.debug(format!("can't load last entry: {e:#}")),
        }
        Ok(all)
    }

    /// Logs the configured feeds, once at startup.
    pub fn log_feeds(&self) {
        let log = telemetry::poll();
        for f in &self.feeds {
            log.info_kv(
                &format!("📡 feed {} ({}) type={} keep={} lang={:?}", f.name, f.id, f.kind.as_str(), self.keep(f), f.language),
                [("id", f.id.clone()), ("keep", self.keep(f).to_string())],
            );
        }
    }
}

#[async_trait]
impl PeriodicJob for Service {
    type Output = RunStats;

    fn name(&self) -> &'static str {
        "channels"
    }

    async fn execute(&self) -> Result<RunStats> {
        self.process_channels().await
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entry::Entry;

mod pg;

pub use pg::{connect_lazy, PgStore};

/// Outcome of dropping old entries of a channel.
///
/// `files` always lists the backing files of entries whose metadata was
/// removed, even when `error` reports that some removals failed.
#[derive(Debug, Default)]
pub struct Pruned {
    pub files: Vec<String>,
    pub error: Option<anyhow::Error>,
}

/// Durable entry metadata plus the per-identity processed marker.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Returns false when an entry with this identity was already stored.
    async fn save(&self, entry: &Entry) -> Result<bool>;
    /// Up to `max` entries of a channel, newest first.
    async fn load(&self, channel_id: &str, max: usize) -> Result<Vec<Entry>>;
    async fn exists(&self, entry: &Entry) -> Result<bool>;
    /// Keeps the newest `keep` entries of a channel and drops the rest.
    async fn remove_old(&self, channel_id: &str, keep: usize) -> Pruned;
    async fn mark_processed(&self, entry: &Entry) -> Result<()>;
    /// When the identity was marked processed, if ever.
    async fn check_processed(&self, entry: &Entry) -> Result<Option<DateTime<Utc>>>;
    async fn count_processed(&self) -> usize;
    async fn most_recent(&self) -> Result<Option<Entry>>;
}

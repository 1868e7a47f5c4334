use chrono::{DateTime, Utc};

use crate::entry::Entry;
use crate::store::EntryStore;
use crate::telemetry::{self};

/// Whether an entry still needs a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    New,
    /// A stored entry with this identity exists (data written before
    /// processed markers were recorded).
    Stored,
    /// A processed marker exists.
    Processed(DateTime<Utc>),
}

impl Verdict {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, Verdict::New)
    }
}

/// Either signal marks a duplicate. Lookup errors count as "not found" so a
/// flaky store costs a re-download rather than a lost item.
pub async fn classify(store: &dyn EntryStore, entry: &Entry) -> Verdict {
    let log = telemetry::poll();

    match store.exists(entry).await {
        Ok(true) => return Verdict::Stored,
        Ok(false) => {}
        Err(e) => log.warn(format!("can't check if {} exists: {e:#}", entry.identity())),
    }

    match store.check_processed(entry).await {
        Ok(Some(ts)) => Verdict::Processed(ts),
        Ok(None) => Verdict::New,
        Err(e) => {
            log.warn(format!("can't get processed status for {}: {e:#}", entry.identity()));
            Verdict::New
        }
    }
}

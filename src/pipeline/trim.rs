use std::path::Path;

use crate::config::FeedInfo;
use crate::store::EntryStore;
use crate::telemetry;

use super::Service;

/// Retain the newest `keep + 1` stored entries of a feed and delete the
/// backing files of everything dropped. Returns how many files were removed.
///
/// One extra entry beyond the publication bound stays stored so the rendered
/// document is always full even when the newest entry gets replaced.
pub async fn trim_channel(store: &dyn EntryStore, feed: &FeedInfo, keep: usize) -> usize {
    let log = telemetry::poll();
    let pruned = store.remove_old(&feed.id, keep + 1).await;
    if let Some(e) = &pruned.error {
        log.warn(format!("failed to remove some old entries for {}: {e:#}", feed.name));
    }

    let mut removed = 0usize;
    for file in &pruned.files {
        match tokio::fs::remove_file(Path::new(file)).await {
            Ok(()) => {
                removed += 1;
                log.info(format!("removed old file {file} for {}", feed.name));
            }
            Err(e) => log.warn(format!("failed to delete {file}: {e}")),
        }
    }
    removed
}

impl Service {
    pub async fn trim(&self, feed: &FeedInfo, keep: usize) -> usize {
        trim_channel(self.store.as_ref(), feed, keep).await
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::Instrument;

use crate::config::FeedInfo;
use crate::entry::Entry;
use crate::telemetry;
use crate::telemetry::ops::poll::Phase as PollPhase;
use crate::util::fname::file_token;
use crate::util::time::fresh_window;

use super::classify::classify;
use super::stats::RunStats;
use super::Service;

#[derive(Debug, Default)]
pub struct ChannelOutcome {
    pub stats: RunStats,
    /// At least one entry was added to the store.
    pub changed: bool,
}

impl Service {
    /// One pass over one feed.
    ///
    /// Stops once `keep` entries were handled (added or skipped). Download
    /// failures are not handled and get retried next tick. Only a store
    /// save error is returned.
    pub async fn process_channel(&self, feed: &FeedInfo) -> Result<ChannelOutcome> {
        let log = telemetry::poll();
        let keep = self.keep(feed);
        let mut out = ChannelOutcome::default();

        let listed = self.lister.list(&feed.id, feed.kind).instrument(log.span(&PollPhase::List)).await;
        let entries = match listed {
            Ok(entries) => entries,
            Err(e) => {
                log.warn(format!("failed to get channel entries for {}: {e:#}", feed.id));
                return Ok(out);
            }
        };
        log.info(format!("got {} entries for {}, limit to {}", entries.len(), feed.name, keep));

        let mut handled = 0usize;
        for (i, mut entry) in entries.into_iter().enumerate() {
            out.stats.entries += 1;
            if handled >= keep {
                break;
            }

            let verdict = classify(self.store.as_ref(), &entry).instrument(log.span(&PollPhase::Classify)).await;
            if verdict.is_duplicate() {
                log.debug(format!("skip {} ({:?})", entry.identity(), verdict));
                out.stats.skipped += 1;
                handled += 1;
                continue;
            }

            log.info(format!("new entry [{}] {}, {}, {}", i + 1, entry.video_id, entry.title, feed.name));
            let fetched = self
                .downloader
                .fetch(&entry.video_id, &file_token(&entry))
                .instrument(log.span_kv(&PollPhase::Download, [("video_id", entry.video_id.clone())]))
                .await;
            let file = match fetched {
                Ok(file) => file,
                Err(e) => {
                    out.stats.ignored += 1;
                    log.warn(format!("failed to download {}: {e:#}", entry.video_id));
                    continue;
                }
            };
            handled += 1;
            log.info(format!("downloaded {} ({}) to {}, channel: {}", entry.video_id, entry.title, file, feed.name));

            entry.file = file;
            prepare_entry(&mut entry, feed, Utc::now());

            let inserted = self
                .store
                .save(&entry)
                .instrument(log.span(&PollPhase::Save))
                .await
                .with_context(|| format!("failed to save entry {entry}"))?;
            if !inserted {
                log.warn(format!("attempt to save dup entry {entry}"));
            }
            out.changed = true;

            if let Err(e) = self.store.mark_processed(&entry).await {
                log.warn(format!("failed to set processed status for {}: {e:#}", entry.video_id));
            }
            out.stats.added += 1;
            log.info(format!("saved {} ({}) to {}, channel: {}", entry.video_id, entry.title, entry.file, feed.name));
        }
        out.stats.processed += handled;

        if out.changed {
            out.stats.removed += self.trim(feed, keep).instrument(log.span(&PollPhase::Trim)).await;
            self.publish_feed(feed, keep).await;
        }

        log.channel_summary(&feed.name, &out.stats, out.changed);
        Ok(out)
    }
}

/// Fix up a freshly downloaded entry before it is stored.
///
/// Entries published less than a day before `now` are re-stamped with `now`
/// so items back-filled when a channel is added never sort ahead of newer
/// uploads. Titles get the feed name as prefix unless they contain it.
pub fn prepare_entry(entry: &mut Entry, feed: &FeedInfo, now: DateTime<Utc>) {
    if now - entry.published < fresh_window() {
        entry.published = now;
    }
    if !entry.title.contains(&feed.name) {
        entry.title = format!("{}: {}", feed.name, entry.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntryStore;
    use crate::testutil::{entry, feed, Harness};
    use chrono::Duration;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn title_gets_feed_name_once() {
        let f = feed("My Show", "C1");
        let now = at("2024-03-10T12:00:00Z");
        let mut e = entry("C1", "V1", 0);
        e.title = "Episode 5".into();
        prepare_entry(&mut e, &f, now);
        assert_eq!(e.title, "My Show: Episode 5");
        prepare_entry(&mut e, &f, now);
        assert_eq!(e.title, "My Show: Episode 5");
    }

    #[test]
    fn recent_publication_is_restamped() {
        let f = feed("My Show", "C1");
        let now = at("2024-03-10T12:00:00Z");
        let mut e = entry("C1", "V1", 0);
        e.published = now - Duration::hours(2);
        prepare_entry(&mut e, &f, now);
        assert_eq!(e.published, now);
    }

    #[test]
    fn old_publication_is_kept() {
        let f = feed("My Show", "C1");
        let now = at("2024-03-10T12:00:00Z");
        let mut e = entry("C1", "V1", 0);
        let published = now - Duration::days(10);
        e.published = published;
        prepare_entry(&mut e, &f, now);
        assert_eq!(e.published, published);
    }

    #[tokio::test]
    async fn duplicates_are_never_downloaded() {
        let h = Harness::new();
        let stored = entry("C1", "V1", 1);
        let marked = entry("C1", "V2", 2);
        h.store.insert(&stored);
        h.store.mark_processed(&marked).await.unwrap();
        h.lister.set("C1", vec![stored.clone(), marked.clone()]);

        let svc = h.service(vec![feed("One", "C1")], 5);
        let out = svc.process_channel(&svc.feeds[0]).await.unwrap();

        assert!(h.downloader.calls().is_empty());
        assert_eq!(out.stats.skipped, 2);
        assert_eq!(out.stats.processed, 2);
        assert!(!out.changed);
        assert!(h.publisher.saved().is_empty());
    }

    #[tokio::test]
    async fn handled_count_never_exceeds_keep() {
        let h = Harness::new();
        let listed: Vec<_> = (0..6).map(|i| entry("C1", &format!("V{i}"), i)).collect();
        h.store.insert(&listed[1]);
        h.lister.set("C1", listed);

        let svc = h.service(vec![feed("One", "C1")], 3);
        let out = svc.process_channel(&svc.feeds[0]).await.unwrap();

        assert_eq!(out.stats.added + out.stats.skipped, 3);
        assert_eq!(out.stats.processed, 3);
        assert_eq!(out.stats.entries, 4);
        assert_eq!(h.downloader.calls(), vec!["V0".to_string(), "V2".to_string()]);
    }

    #[tokio::test]
    async fn failed_download_is_not_handled_and_not_marked() {
        let h = Harness::new();
        h.downloader.fail_on("V1");
        let e1 = entry("C1", "V1", 0);
        h.lister.set("C1", vec![e1.clone(), entry("C1", "V2", 1), entry("C1", "V3", 2)]);

        let svc = h.service(vec![feed("One", "C1")], 2);
        let out = svc.process_channel(&svc.feeds[0]).await.unwrap();

        assert_eq!(out.stats.ignored, 1);
        assert_eq!(out.stats.added, 2);
        assert_eq!(out.stats.processed, 2);
        assert!(h.store.check_processed(&e1).await.unwrap().is_none());
        assert!(!h.store.exists(&e1).await.unwrap());
        assert_eq!(h.downloader.calls(), vec!["V1", "V2", "V3"]);
    }

    #[tokio::test]
    async fn stored_entry_is_normalized_and_marked() {
        let h = Harness::new();
        let mut e = entry("C1", "V1", 0);
        e.title = "Episode 5".into();
        h.lister.set("C1", vec![e.clone()]);

        let svc = h.service(vec![feed("My Show", "C1")], 2);
        let before = Utc::now();
        svc.process_channel(&svc.feeds[0]).await.unwrap();

        let stored = h.store.stored("C1");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "My Show: Episode 5");
        assert!(stored[0].published >= before);
        assert!(stored[0].file.ends_with(&format!("{}.mp3", file_token(&e))));
        assert!(h.store.check_processed(&e).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn marker_failure_is_not_fatal() {
        let h = Harness::new();
        h.store.fail_mark(true);
        h.lister.set("C1", vec![entry("C1", "V1", 0)]);

        let svc = h.service(vec![feed("One", "C1")], 2);
        let out = svc.process_channel(&svc.feeds[0]).await.unwrap();

        assert_eq!(out.stats.added, 1);
        assert!(out.changed);
        assert_eq!(h.store.count_processed().await, 0);
        assert_eq!(h.publisher.saved().len(), 1);
    }

    #[tokio::test]
    async fn save_reporting_duplicate_is_not_fatal() {
        let h = Harness::new();
        let e = entry("C1", "V1", 0);
        h.store.insert(&e);
        // existence lookup broken, so the stored copy is not seen
        h.store.fail_exists(true);
        h.lister.set("C1", vec![e.clone()]);

        let svc = h.service(vec![feed("One", "C1")], 2);
        let out = svc.process_channel(&svc.feeds[0]).await.unwrap();

        assert_eq!(out.stats.added, 1);
        assert!(out.changed);
        assert_eq!(h.store.stored("C1").len(), 1);
    }

    #[tokio::test]
    async fn save_error_is_returned() {
        let h = Harness::new();
        h.store.fail_save(true);
        h.lister.set("C1", vec![entry("C1", "V1", 0)]);

        let svc = h.service(vec![feed("One", "C1")], 2);
        let err = svc.process_channel(&svc.feeds[0]).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to save entry"));
    }
}

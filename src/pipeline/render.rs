use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rss::{Channel, ChannelBuilder, EnclosureBuilder, GuidBuilder, Item, ItemBuilder};
use tracing::Instrument;

use crate::config::{FeedInfo, FeedKind};
use crate::entry::Entry;
use crate::store::EntryStore;
use crate::telemetry;
use crate::telemetry::ops::poll::Phase as PollPhase;
use crate::util::time::format_pub_date;

const FEED_DESCRIPTION: &str = "generated by castfeed";
const AUDIO_MIME: &str = "audio/mpeg";

/// Render up to `keep` stored entries of a feed as an RSS 2.0 document.
///
/// Returns an empty string when the channel has nothing stored.
pub async fn render_feed(store: &dyn EntryStore, feed: &FeedInfo, keep: usize, root_url: &str) -> Result<String> {
    let log = telemetry::poll();
    let entries = store
        .load(&feed.id, keep)
        .await
        .with_context(|| format!("failed to load entries for {}", feed.id))?;
    if entries.is_empty() {
        return Ok(String::new());
    }

    let mut sized = Vec::with_capacity(entries.len());
    for entry in entries {
        let size = match tokio::fs::metadata(&entry.file).await {
            Ok(md) => md.len(),
            Err(e) => {
                log.warn(format!("can't get file size for {}: {e}", entry.file));
                0
            }
        };
        sized.push((entry, size));
    }

    let channel = build_channel(feed, &sized, root_url, Utc::now());
    let buf = channel
        .pretty_write_to(Vec::new(), b' ', 2)
        .context("failed to write rss document")?;
    String::from_utf8(buf).context("rss document is not utf-8")
}

pub fn build_channel(feed: &FeedInfo, entries: &[(Entry, u64)], root_url: &str, now: DateTime<Utc>) -> Channel {
    let items: Vec<Item> = entries.iter().map(|(e, size)| build_item(e, *size, root_url)).collect();

    let link = match feed.kind {
        FeedKind::Playlist => feed.playlist_url(),
        FeedKind::Video => entries.first().map(|(e, _)| e.author.uri.clone()).unwrap_or_default(),
    };
    let language = (!feed.language.is_empty()).then(|| feed.language.clone());
    let pub_date = items.first().and_then(|i| i.pub_date().map(str::to_string));

    ChannelBuilder::default()
        .title(feed.name.clone())
        .link(link)
        .description(FEED_DESCRIPTION.to_string())
        .language(language)
        .pub_date(pub_date)
        .last_build_date(Some(format_pub_date(&now)))
        .items(items)
        .build()
}

fn build_item(entry: &Entry, size: u64, root_url: &str) -> Item {
    let enclosure = EnclosureBuilder::default()
        .url(enclosure_url(root_url, &entry.file))
        .length(size.to_string())
        .mime_type(AUDIO_MIME.to_string())
        .build();
    let guid = GuidBuilder::default()
        .value(entry.identity())
        .permalink(false)
        .build();

    ItemBuilder::default()
        .title(Some(entry.title.clone()))
        .link(Some(entry.link.clone()))
        .description(Some(entry.description.clone()))
        .author(Some(entry.author.name.clone()))
        .pub_date(Some(format_pub_date(&entry.published)))
        .guid(Some(guid))
        .enclosure(Some(enclosure))
        .build()
}

/// Root URL joined with the base name of the stored file.
pub fn enclosure_url(root_url: &str, file: &str) -> String {
    let base = Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}", root_url.trim_end_matches('/'), base)
}

impl super::Service {
    /// Render and hand the document to the publisher. Failures are logged only.
    pub async fn publish_feed(&self, feed: &FeedInfo, keep: usize) {
        let log = telemetry::poll();
        let rendered = render_feed(self.store.as_ref(), feed, keep, &self.root_url)
            .instrument(log.span(&PollPhase::Render))
            .await;
        let document = match rendered {
            Ok(doc) if doc.is_empty() => {
                log.warn(format!("nothing to publish for {}", feed.name));
                return;
            }
            Ok(doc) => doc,
            Err(e) => {
                log.warn(format!("failed to render feed {}: {e:#}", feed.id));
                return;
            }
        };

        match self.publisher.save(&feed.id, &document).instrument(log.span(&PollPhase::Publish)).await {
            Ok(()) => log.info(format!("published feed {} ({})", feed.name, feed.id)),
            Err(e) => log.warn(format!("failed to publish feed {}: {e:#}", feed.id)),
        }
    }
}

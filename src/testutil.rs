//! In-memory collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use crate::config::{FeedInfo, FeedKind};
use crate::download::Downloader;
use crate::entry::{Author, Entry};
use crate::pipeline::Service;
use crate::publish::FeedPublisher;
use crate::source::ChannelLister;
use crate::store::{EntryStore, Pruned};
use crate::util::fname::file_token;

pub fn entry(channel: &str, video: &str, days_old: i64) -> Entry {
    Entry {
        channel_id: channel.to_string(),
        video_id: video.to_string(),
        title: format!("Title {video}"),
        published: Utc::now() - Duration::days(days_old),
        author: Author {
            name: format!("Author {channel}"),
            uri: format!("https://www.youtube.com/channel/{channel}"),
        },
        link: format!("https://www.youtube.com/watch?v={video}"),
        description: format!("Description of {video}"),
        file: String::new(),
    }
}

pub fn feed(name: &str, id: &str) -> FeedInfo {
    FeedInfo { name: name.to_string(), id: id.to_string(), kind: FeedKind::Video, keep: None, language: String::new() }
}

fn newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.published.cmp(&a.published).then_with(|| b.video_id.cmp(&a.video_id)));
}

#[derive(Default)]
pub struct MemStore {
    entries: Mutex<HashMap<(String, String), Entry>>,
    processed: Mutex<HashMap<(String, String), DateTime<Utc>>>,
    save_fails: AtomicBool,
    exists_fails: AtomicBool,
    check_fails: AtomicBool,
    mark_fails: AtomicBool,
    prune_fails: AtomicBool,
}

impl MemStore {
    fn key(e: &Entry) -> (String, String) {
        (e.channel_id.clone(), e.video_id.clone())
    }

    pub fn insert(&self, e: &Entry) {
        self.entries.lock().unwrap().insert(Self::key(e), e.clone());
    }

    /// Stores the entry with a real backing file in the downloader's
    /// directory, without recording a download call.
    pub fn insert_downloaded(&self, e: &Entry, dl: &FakeDownloader) -> Entry {
        let path = dl.path_for(&file_token(e));
        std::fs::write(&path, b"audio").unwrap();
        let mut stored = e.clone();
        stored.file = path.to_string_lossy().into_owned();
        self.insert(&stored);
        stored
    }

    /// Entries of a channel, newest first.
    pub fn stored(&self, channel: &str) -> Vec<Entry> {
        let mut out: Vec<Entry> =
            self.entries.lock().unwrap().values().filter(|e| e.channel_id == channel).cloned().collect();
        newest_first(&mut out);
        out
    }

    pub fn fail_save(&self, on: bool) { self.save_fails.store(on, Ordering::SeqCst); }
    pub fn fail_exists(&self, on: bool) { self.exists_fails.store(on, Ordering::SeqCst); }
    pub fn fail_check(&self, on: bool) { self.check_fails.store(on, Ordering::SeqCst); }
    pub fn fail_mark(&self, on: bool) { self.mark_fails.store(on, Ordering::SeqCst); }
    /// `remove_old` drops every stale row except the oldest and reports an error for it.
    pub fn fail_prune(&self, on: bool) { self.prune_fails.store(on, Ordering::SeqCst); }
}

#[async_trait]
impl EntryStore for MemStore {
    async fn save(&self, entry: &Entry) -> Result<bool> {
        if self.save_fails.load(Ordering::SeqCst) { bail!("store is read-only"); }
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&Self::key(entry)) {
            return Ok(false);
        }
        entries.insert(Self::key(entry), entry.clone());
        Ok(true)
    }

    async fn load(&self, channel_id: &str, max: usize) -> Result<Vec<Entry>> {
        let mut out = self.stored(channel_id);
        out.truncate(max);
        Ok(out)
    }

    async fn exists(&self, entry: &Entry) -> Result<bool> {
        if self.exists_fails.load(Ordering::SeqCst) { bail!("exists lookup failed"); }
        Ok(self.entries.lock().unwrap().contains_key(&Self::key(entry)))
    }

    async fn remove_old(&self, channel_id: &str, keep: usize) -> Pruned {
        let mut stale: Vec<Entry> = self.stored(channel_id).into_iter().skip(keep).collect();
        let mut pruned = Pruned::default();
        if self.prune_fails.load(Ordering::SeqCst) {
            if let Some(stuck) = stale.pop() {
                pruned.error = Some(anyhow::anyhow!("failed to delete {}", stuck.identity()));
            }
        }
        let mut entries = self.entries.lock().unwrap();
        for e in stale {
            entries.remove(&Self::key(&e));
            if !e.file.is_empty() { pruned.files.push(e.file); }
        }
        pruned
    }

    async fn mark_processed(&self, entry: &Entry) -> Result<()> {
        if self.mark_fails.load(Ordering::SeqCst) { bail!("marker write failed"); }
        self.processed.lock().unwrap().insert(Self::key(entry), Utc::now());
        Ok(())
    }

    async fn check_processed(&self, entry: &Entry) -> Result<Option<DateTime<Utc>>> {
        if self.check_fails.load(Ordering::SeqCst) { bail!("marker lookup failed"); }
        Ok(self.processed.lock().unwrap().get(&Self::key(entry)).copied())
    }

    async fn count_processed(&self) -> usize {
        self.processed.lock().unwrap().len()
    }

    async fn most_recent(&self) -> Result<Option<Entry>> {
        let mut all: Vec<Entry> = self.entries.lock().unwrap().values().cloned().collect();
        newest_first(&mut all);
        Ok(all.into_iter().next())
    }
}

/// Lister returning whatever was scripted per feed id.
#[derive(Default)]
pub struct FakeLister {
    listings: Mutex<HashMap<String, Vec<Entry>>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeLister {
    pub fn set(&self, feed_id: &str, entries: Vec<Entry>) {
        self.listings.lock().unwrap().insert(feed_id.to_string(), entries);
    }

    pub fn fail(&self, feed_id: &str) {
        self.failing.lock().unwrap().insert(feed_id.to_string());
    }
}

#[async_trait]
impl ChannelLister for FakeLister {
    async fn list(&self, feed_id: &str, _kind: FeedKind) -> Result<Vec<Entry>> {
        if self.failing.lock().unwrap().contains(feed_id) { bail!("listing {feed_id} failed"); }
        Ok(self.listings.lock().unwrap().get(feed_id).cloned().unwrap_or_default())
    }
}

/// Writes a small file per fetch into a temp dir and records item ids.
pub struct FakeDownloader {
    dir: TempDir,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap(), calls: Mutex::new(Vec::new()), failing: Mutex::new(HashSet::new()) }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(format!("{file_name}.mp3"))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_on(&self, item_id: &str) {
        self.failing.lock().unwrap().insert(item_id.to_string());
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn fetch(&self, item_id: &str, file_name: &str) -> Result<String> {
        self.calls.lock().unwrap().push(item_id.to_string());
        if self.failing.lock().unwrap().contains(item_id) { bail!("download of {item_id} failed"); }
        let path = self.path_for(file_name);
        tokio::fs::write(&path, item_id.as_bytes()).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    saved: Mutex<Vec<(String, String)>>,
    fails: AtomicBool,
}

impl RecordingPublisher {
    pub fn saved(&self) -> Vec<(String, String)> {
        self.saved.lock().unwrap().clone()
    }

    pub fn fail(&self, on: bool) { self.fails.store(on, Ordering::SeqCst); }
}

#[async_trait]
impl FeedPublisher for RecordingPublisher {
    async fn save(&self, feed_id: &str, document: &str) -> Result<()> {
        if self.fails.load(Ordering::SeqCst) { bail!("publish target unavailable"); }
        self.saved.lock().unwrap().push((feed_id.to_string(), document.to_string()));
        Ok(())
    }
}

/// One of each fake, shared with the Service under test.
pub struct Harness {
    pub lister: Arc<FakeLister>,
    pub downloader: Arc<FakeDownloader>,
    pub store: Arc<MemStore>,
    pub publisher: Arc<RecordingPublisher>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            lister: Arc::new(FakeLister::default()),
            downloader: Arc::new(FakeDownloader::new()),
            store: Arc::new(MemStore::default()),
            publisher: Arc::new(RecordingPublisher::default()),
        }
    }

    pub fn service(&self, feeds: Vec<FeedInfo>, keep: usize) -> Service {
        Service {
            feeds,
            lister: self.lister.clone(),
            downloader: self.downloader.clone(),
            store: self.store.clone(),
            publisher: self.publisher.clone(),
            keep_per_channel: keep,
            root_url: "https://example.com/audio".to_string(),
        }
    }
}

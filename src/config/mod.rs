use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::util::time::parse_interval;

pub mod types;

pub use types::{FeedInfo, FeedKind};

const DEFAULT_KEEP: usize = 10;
const DEFAULT_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IntervalSpec {
    Secs(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    root_url: String,
    #[serde(default)]
    keep: Option<usize>,
    #[serde(default)]
    interval: Option<IntervalSpec>,
    #[serde(default = "default_files_dir")]
    files_dir: PathBuf,
    #[serde(default = "default_feeds_dir")]
    feeds_dir: PathBuf,
    #[serde(default)]
    list_cmd: String,
    #[serde(default)]
    download_cmd: String,
    #[serde(default)]
    feeds: Vec<FeedInfo>,
}

fn default_files_dir() -> PathBuf { PathBuf::from("var/audio") }
fn default_feeds_dir() -> PathBuf { PathBuf::from("var/rss") }

/// Runtime configuration, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root_url: String,
    /// Global default retention per feed.
    pub keep: usize,
    pub interval: Duration,
    pub files_dir: PathBuf,
    pub feeds_dir: PathBuf,
    pub list_cmd: String,
    pub download_cmd: String,
    pub feeds: Vec<FeedInfo>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut settings = Self::from_yaml(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        settings.apply_overrides(|k| std::env::var(k).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let file: SettingsFile = serde_yaml::from_str(raw)?;
        let interval = match file.interval {
            None => Duration::from_secs(DEFAULT_INTERVAL_SECS),
            Some(IntervalSpec::Secs(n)) => Duration::from_secs(n),
            Some(IntervalSpec::Text(s)) => match parse_interval(&s) {
                Some(d) => d,
                None => bail!("invalid interval: {s}"),
            },
        };
        Ok(Settings {
            root_url: file.root_url,
            keep: file.keep.unwrap_or(DEFAULT_KEEP),
            interval,
            files_dir: file.files_dir,
            feeds_dir: file.feeds_dir,
            list_cmd: file.list_cmd,
            download_cmd: file.download_cmd,
            feeds: file.feeds,
        })
    }

    /// CASTFEED_ROOT_URL, CASTFEED_KEEP and CASTFEED_INTERVAL win over the file.
    pub fn apply_overrides<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = get("CASTFEED_ROOT_URL") {
            self.root_url = root;
        }
        if let Some(keep) = get("CASTFEED_KEEP") {
            self.keep = keep.trim().parse().with_context(|| format!("invalid CASTFEED_KEEP: {keep}"))?;
        }
        if let Some(interval) = get("CASTFEED_INTERVAL") {
            match parse_interval(&interval) {
                Some(d) => self.interval = d,
                None => bail!("invalid CASTFEED_INTERVAL: {interval}"),
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if Url::parse(&self.root_url).is_err() { bail!("invalid root_url: {}", self.root_url); }
        if self.keep == 0 { bail!("keep must be positive"); }
        if self.interval.is_zero() { bail!("interval must be positive"); }
        let mut seen = HashSet::new();
        for f in &self.feeds {
            if f.id.trim().is_empty() { bail!("feed {:?} has an empty id", f.name); }
            if !seen.insert(f.id.as_str()) { bail!("duplicate feed id: {}", f.id); }
        }
        Ok(())
    }

    /// Effective retention for a feed.
    pub fn keep(&self, feed: &FeedInfo) -> usize {
        effective_keep(feed, self.keep)
    }
}

pub fn effective_keep(feed: &FeedInfo, default: usize) -> usize {
    match feed.keep {
        Some(k) if k > 0 => k,
        _ => default,
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

/// One downloadable item of a channel or playlist.
///
/// `(channel_id, video_id)` is the identity; it is stable across runs and
/// names at most one stored entry and one processed marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub channel_id: String,
    pub video_id: String,
    pub title: String,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    /// Local audio file; empty until downloaded.
    #[serde(default)]
    pub file: String,
}

impl Entry {
    /// `channel::video`, used for file name tokens and feed guids.
    pub fn identity(&self) -> String {
        format!("{}::{}", self.channel_id, self.video_id)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ChannelID:{}, VideoID:{}, Title:{}, Published:{}, File:{}}}",
            self.channel_id,
            self.video_id,
            self.title,
            self.published.to_rfc3339(),
            self.file
        )
    }
}

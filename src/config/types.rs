use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    #[serde(alias = "channel")]
    Video,
    Playlist,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Video => "video",
            FeedKind::Playlist => "playlist",
        }
    }
}

/// One configured channel or playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedInfo {
    pub name: String,
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: FeedKind,
    /// Retention override; absent or 0 means the global default.
    #[serde(default)]
    pub keep: Option<usize>,
    #[serde(rename = "lang", default)]
    pub language: String,
}

impl FeedInfo {
    /// Canonical page for playlist feeds.
    pub fn playlist_url(&self) -> String {
        format!("https://www.youtube.com/playlist?list={}", self.id)
    }
}

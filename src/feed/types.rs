use serde::Serialize;

use crate::config::Settings;

#[derive(Debug, Serialize, PartialEq)]
pub struct FeedRow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub keep: usize,
    pub language: String,
}

#[derive(Serialize)]
pub struct FeedList {
    pub feeds: Vec<FeedRow>,
}

#[derive(Serialize)]
pub struct FeedRenderResult {
    pub id: String,
    pub items: usize,
    pub published: bool,
    pub path: Option<String>,
    /// Present when the document went to stdout instead of the publisher.
    pub document: Option<String>,
}

/// Configured feeds with their effective retention, in config order.
pub fn feed_rows(settings: &Settings) -> Vec<FeedRow> {
    settings
        .feeds
        .iter()
        .map(|f| FeedRow {
            id: f.id.clone(),
            name: f.name.clone(),
            kind: f.kind.as_str(),
            keep: settings.keep(f),
            language: f.language.clone(),
        })
        .collect()
}

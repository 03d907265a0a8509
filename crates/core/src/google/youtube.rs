use crate::config::Settings;
use crate::domain::content::ContentItem;
use crate::google::{http_client, send_json};
use anyhow::Context;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const MAX_RESULTS_PER_QUERY: u32 = 20;
// videos.list accepts at most 50 ids per call.
const DETAILS_BATCH: usize = 50;

/// Recent-video discovery capability.
#[async_trait::async_trait]
pub trait VideoSearch: Send + Sync {
    /// Videos matching any of `queries` published after `published_after`
    /// (RFC 3339), de-duplicated by id in first-seen order.
    async fn recent_videos(
        &self,
        queries: &[String],
        published_after: &str,
    ) -> anyhow::Result<Vec<ContentItem>>;
}

#[derive(Debug, Clone)]
pub struct YoutubeSearch {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YoutubeSearch {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client("YOUTUBE_TIMEOUT_SECS")?,
            api_key: settings.require_youtube_api_key()?.to_string(),
            base_url: std::env::var("YOUTUBE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn search(&self, query: &str, published_after: &str) -> anyhow::Result<Vec<ContentItem>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let max_results = MAX_RESULTS_PER_QUERY.to_string();
        let req = self.http.get(url).query(&[
            ("part", "snippet"),
            ("q", query),
            ("type", "video"),
            ("publishedAfter", published_after),
            ("maxResults", max_results.as_str()),
            ("order", "date"),
            ("key", self.api_key.as_str()),
        ]);
        let res: SearchListResponse = send_json(req, "YouTube search").await?;
        Ok(res.items.into_iter().filter_map(SearchItem::into_content).collect())
    }

    async fn details(&self, ids: &[String]) -> anyhow::Result<HashMap<String, VideoSnippet>> {
        let url = format!("{}/videos", self.base_url.trim_end_matches('/'));
        let mut out = HashMap::new();
        for batch in ids.chunks(DETAILS_BATCH) {
            let joined = batch.join(",");
            let req = self.http.get(&url).query(&[
                ("part", "snippet"),
                ("id", joined.as_str()),
                ("key", self.api_key.as_str()),
            ]);
            let res: VideoListResponse = send_json(req, "YouTube videos").await?;
            out.extend(res.items.into_iter().map(|v| (v.id, v.snippet)));
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl VideoSearch for YoutubeSearch {
    async fn recent_videos(
        &self,
        queries: &[String],
        published_after: &str,
    ) -> anyhow::Result<Vec<ContentItem>> {
        let mut per_query = Vec::with_capacity(queries.len());
        for query in queries {
            match self.search(query, published_after).await {
                Ok(items) => {
                    tracing::info!(query = %query, found = items.len(), "search completed");
                    per_query.push(items);
                }
                Err(err) => {
                    tracing::warn!(query = %query, error = %err, "search failed; skipping query");
                }
            }
        }

        let mut videos = merge_unique(per_query);
        if videos.is_empty() {
            return Ok(videos);
        }

        let ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
        match self.details(&ids).await.context("failed to fetch video details") {
            Ok(details) => apply_details(&mut videos, &details),
            Err(err) => {
                tracing::warn!(error = %err, "continuing without tags/description");
            }
        }
        Ok(videos)
    }
}

/// Flattens per-query results, keeping the first occurrence of each id.
pub fn merge_unique(per_query: Vec<Vec<ContentItem>>) -> Vec<ContentItem> {
    let mut seen = HashSet::new();
    per_query
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

fn apply_details(videos: &mut [ContentItem], details: &HashMap<String, VideoSnippet>) {
    for video in videos.iter_mut() {
        let Some(snippet) = details.get(&video.id) else {
            continue;
        };
        // search.list titles are HTML-escaped; videos.list titles are not.
        if !snippet.title.is_empty() {
            video.title = snippet.title.clone();
        }
        video.description = snippet.description.clone();
        video.tags = snippet.tags.clone();
    }
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: String,
    #[serde(rename = "publishedAt")]
    published_at: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(default)]
    description: String,
}

impl SearchItem {
    fn into_content(self) -> Option<ContentItem> {
        Some(ContentItem {
            id: self.id.video_id?,
            title: html_escape::decode_html_entities(&self.snippet.title).into_owned(),
            description: self.snippet.description,
            tags: Vec::new(),
            published_at: self.snippet.published_at,
            channel_title: self.snippet.channel_title,
        })
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
}

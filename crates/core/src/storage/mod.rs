use crate::domain::content::ContentItem;
use crate::domain::recommendation::Recommendation;
use crate::slides::publish::DeckLink;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const VIDEOS_FILE: &str = "videos.json";
pub const RECOMMENDATIONS_FILE: &str = "analysis_results.json";
pub const DECK_LINK_FILE: &str = "slide_link.json";

/// Flat JSON files handed from one stage to the next.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn load_videos(&self) -> anyhow::Result<Option<Vec<ContentItem>>> {
        self.read(VIDEOS_FILE).await
    }

    pub async fn save_videos(&self, videos: &[ContentItem]) -> anyhow::Result<()> {
        self.write(VIDEOS_FILE, &videos).await
    }

    pub async fn load_recommendations(&self) -> anyhow::Result<Option<Vec<Recommendation>>> {
        self.read(RECOMMENDATIONS_FILE).await
    }

    pub async fn save_recommendations(&self, recs: &[Recommendation]) -> anyhow::Result<()> {
        self.write(RECOMMENDATIONS_FILE, &recs).await
    }

    pub async fn load_deck_link(&self) -> anyhow::Result<Option<DeckLink>> {
        self.read(DECK_LINK_FILE).await
    }

    pub async fn save_deck_link(&self, link: &DeckLink) -> anyhow::Result<()> {
        self.write(DECK_LINK_FILE, link).await
    }

    /// `Ok(None)` when the file does not exist.
    async fn read<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        let path = self.root.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        let value = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    async fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let path = self.root.join(name);
        let tmp = self.root.join(format!(".{name}.tmp"));
        let json = serde_json::to_vec_pretty(value).context("failed to serialize")?;
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to replace {}", path.display()))?;
        tracing::debug!(path = %path.display(), "saved");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::recommendation::{Action, Market, SourceType};

    /// Fresh directory under the system temp dir.
    pub(crate) fn scratch_dir(tag: &str) -> DataDir {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        DataDir::new(std::env::temp_dir().join(format!(
            "sampro-{tag}-{}-{nanos}",
            std::process::id()
        )))
    }

    #[tokio::test]
    async fn missing_files_load_as_none() {
        let dir = scratch_dir("missing");
        assert!(dir.load_videos().await.unwrap().is_none());
        assert!(dir.load_recommendations().await.unwrap().is_none());
        assert!(dir.load_deck_link().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn videos_keep_camel_case_keys() {
        let dir = scratch_dir("videos");
        let videos = vec![ContentItem {
            id: "foqCjCwvpNo".to_string(),
            title: "코스닥 3000은 풀악셀".to_string(),
            description: String::new(),
            tags: vec!["코스닥".to_string()],
            published_at: "2024-05-01T09:00:00Z".to_string(),
            channel_title: "삼프로TV".to_string(),
        }];
        dir.save_videos(&videos).await.unwrap();

        let raw = tokio::fs::read_to_string(dir.root().join(VIDEOS_FILE))
            .await
            .unwrap();
        assert!(raw.contains("\"publishedAt\""));
        assert!(raw.contains("\"channelTitle\""));
        assert!(raw.contains("코스닥 3000은 풀악셀"));
        assert_eq!(dir.load_videos().await.unwrap(), Some(videos));

        let _ = tokio::fs::remove_dir_all(dir.root()).await;
    }

    #[tokio::test]
    async fn recommendations_and_deck_link_are_overwritten() {
        let dir = scratch_dir("recs");
        let rec = Recommendation {
            stock_name: "삼성전자".to_string(),
            market: Market::Kr,
            speaker: "이효석".to_string(),
            action: Action::Buy,
            reasoning: "HBM 수주".to_string(),
            time_context: "Short-term".to_string(),
            video_title: "반도체 전망".to_string(),
            video_id: "v1".to_string(),
            source_type: SourceType::Transcript,
        };
        dir.save_recommendations(&[rec.clone(), rec.clone()]).await.unwrap();
        dir.save_recommendations(&[rec.clone()]).await.unwrap();
        assert_eq!(dir.load_recommendations().await.unwrap(), Some(vec![rec]));

        let link = DeckLink {
            id: "abc".to_string(),
            url: "https://docs.google.com/presentation/d/abc/edit".to_string(),
            title: "YouTube Stock Picks".to_string(),
        };
        dir.save_deck_link(&link).await.unwrap();
        assert_eq!(dir.load_deck_link().await.unwrap(), Some(link));

        let _ = tokio::fs::remove_dir_all(dir.root()).await;
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = scratch_dir("corrupt");
        tokio::fs::create_dir_all(dir.root()).await.unwrap();
        tokio::fs::write(dir.root().join(DECK_LINK_FILE), b"{not json")
            .await
            .unwrap();
        assert!(dir.load_deck_link().await.is_err());

        let _ = tokio::fs::remove_dir_all(dir.root()).await;
    }
}

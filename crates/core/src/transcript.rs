use crate::domain::content::ContentItem;
use crate::domain::recommendation::SourceType;
use crate::error::PipelineError;
use yt_transcript_rs::api::YouTubeTranscriptApi;

pub const PREFERRED_LANGUAGES: [&str; 2] = ["ko", "en"];

#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Plain transcript text, or `PipelineError::TranscriptUnavailable`.
    async fn fetch(&self, video_id: &str, languages: &[&str]) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct YoutubeTranscripts {
    api: YouTubeTranscriptApi,
}

impl YoutubeTranscripts {
    pub fn new() -> anyhow::Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| anyhow::anyhow!("failed to initialize transcript client: {e}"))?;
        Ok(Self { api })
    }
}

#[async_trait::async_trait]
impl TranscriptSource for YoutubeTranscripts {
    async fn fetch(&self, video_id: &str, languages: &[&str]) -> anyhow::Result<String> {
        let transcript = self
            .api
            .fetch_transcript(video_id, languages, false)
            .await
            .map_err(|e| PipelineError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                detail: e.to_string(),
            })?;

        let text = transcript
            .snippets
            .iter()
            .map(|snippet| snippet.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            return Err(PipelineError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                detail: "transcript is empty".to_string(),
            }
            .into());
        }
        Ok(text)
    }
}

/// Transcript when one can be fetched, otherwise the title/tags/description
/// fallback. Never fails.
pub async fn analysis_input(
    source: &dyn TranscriptSource,
    item: &ContentItem,
) -> (String, SourceType) {
    match source.fetch(&item.id, &PREFERRED_LANGUAGES).await {
        Ok(text) => {
            tracing::debug!(video_id = %item.id, chars = text.chars().count(), "transcript fetched");
            (text, SourceType::Transcript)
        }
        Err(err) => {
            tracing::info!(
                video_id = %item.id,
                error = %err,
                "no transcript; falling back to title/tags/description"
            );
            (item.fallback_text(), SourceType::TagsDescription)
        }
    }
}

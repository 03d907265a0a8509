use crate::domain::content::ContentItem;
use crate::domain::contract::Provenance;
use crate::domain::recommendation::Recommendation;
use crate::extract::Extractor;
use crate::google::youtube::VideoSearch;
use crate::group::group;
use crate::slides::layout::{plan, RunInfo, RunStatus, SlideSpec};
use crate::slides::publish::{self, DeckLink, DeckRenderer, PublishReport};
use crate::storage::DataDir;
use crate::time::kst;
use crate::transcript::{analysis_input, TranscriptSource};
use chrono::{DateTime, FixedOffset, Utc};
use std::time::Duration;

pub const DEFAULT_EXTRACT_DELAY_SECS: u64 = 15;

/// Pause between videos, from `EXTRACT_DELAY_SECS`.
pub fn extract_delay_from_env() -> Duration {
    let secs = std::env::var("EXTRACT_DELAY_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_EXTRACT_DELAY_SECS);
    Duration::from_secs(secs)
}

/// Recent videos for `queries` within the last `window_hours`.
pub async fn discover(
    search: &dyn VideoSearch,
    queries: &[String],
    now_utc: DateTime<Utc>,
    window_hours: i64,
) -> anyhow::Result<Vec<ContentItem>> {
    let published_after = kst::published_after(now_utc, window_hours);
    tracing::info!(queries = ?queries, %published_after, "discovering videos");
    let videos = search.recent_videos(queries, &published_after).await?;
    tracing::info!(videos = videos.len(), "discovery finished");
    Ok(videos)
}

#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub videos: usize,
    pub failed: usize,
    pub recommendations: Vec<Recommendation>,
}

impl ExtractReport {
    pub fn status(&self) -> RunStatus {
        run_status(self.videos, self.failed, self.recommendations.len())
    }
}

/// Runs every video through transcript lookup and extraction, one at a time,
/// pausing `delay` between videos. Per-video failures are counted, not raised.
pub async fn extract_all(
    extractor: &Extractor<'_>,
    transcripts: &dyn TranscriptSource,
    videos: &[ContentItem],
    delay: Duration,
) -> ExtractReport {
    let mut report = ExtractReport {
        videos: videos.len(),
        ..ExtractReport::default()
    };

    for (idx, video) in videos.iter().enumerate() {
        let (text, source_type) = analysis_input(transcripts, video).await;
        let source = Provenance {
            video_id: &video.id,
            video_title: &video.title,
            source_type,
        };

        match extractor.try_extract(&text, &source).await {
            Ok(recs) => {
                tracing::info!(
                    video_id = %video.id,
                    source = source_type.as_str(),
                    found = recs.len(),
                    "video analyzed"
                );
                report.recommendations.extend(recs);
            }
            Err(err) => {
                tracing::error!(video_id = %video.id, error = %err, "video analysis failed");
                report.failed += 1;
            }
        }

        if idx + 1 < videos.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    tracing::info!(
        videos = report.videos,
        failed = report.failed,
        recommendations = report.recommendations.len(),
        "extraction finished"
    );
    report
}

/// Every analyzed video failing is a failed run; otherwise success when
/// anything was found.
pub fn run_status(videos: usize, failed: usize, recommendations: usize) -> RunStatus {
    if videos > 0 && failed == videos {
        RunStatus::Failed {
            reason: format!("analysis failed for all {videos} videos"),
        }
    } else if recommendations > 0 {
        RunStatus::Success {
            videos,
            recommendations,
        }
    } else {
        RunStatus::NoRecommendations { videos }
    }
}

/// Groups `records` and plans the run's slides.
pub fn plan_run(
    records: &[Recommendation],
    now: DateTime<FixedOffset>,
    channels: &[String],
    status: RunStatus,
) -> Vec<SlideSpec> {
    let groups = group(records);
    let run = RunInfo {
        now,
        channels: channels.to_vec(),
        status,
    };
    plan(&groups, &run)
}

/// Opens the saved deck (or a new one), records its link, then renders
/// `specs` into it. The link is saved before any slide is created so a deck
/// created by a run that later fails is reused next time.
pub async fn publish_run(
    renderer: &dyn DeckRenderer,
    data: &DataDir,
    specs: &[SlideSpec],
    title: &str,
    max_summaries: usize,
) -> anyhow::Result<(DeckLink, PublishReport)> {
    let saved = data.load_deck_link().await?;
    let deck = publish::open_deck(renderer, saved.clone(), title).await?;
    if saved.as_ref() != Some(&deck.link) {
        data.save_deck_link(&deck.link).await?;
        tracing::info!(deck_id = %deck.link.id, "deck link saved");
    }

    let report = publish::publish(renderer, &deck, specs, max_summaries).await?;
    Ok((deck.link, report))
}

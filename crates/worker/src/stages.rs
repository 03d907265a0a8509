use anyhow::Context;
use sampro_core::config::Settings;
use sampro_core::extract::Extractor;
use sampro_core::google::auth::GoogleAuth;
use sampro_core::google::gmail::GmailNotifier;
use sampro_core::google::slides::GoogleSlides;
use sampro_core::google::youtube::YoutubeSearch;
use sampro_core::llm::gemini::GeminiClient;
use sampro_core::notify::{self, Notifier};
use sampro_core::pipeline::{self, ExtractReport};
use sampro_core::slides::layout::RunStatus;
use sampro_core::slides::publish::DEFAULT_DECK_TITLE;
use sampro_core::slides::retention::DEFAULT_MAX_SUMMARIES;
use sampro_core::storage::DataDir;
use sampro_core::time::kst;
use sampro_core::transcript::YoutubeTranscripts;
use std::sync::Arc;

pub struct Ctx {
    settings: Settings,
    data: DataDir,
    dry_run: bool,
}

impl Ctx {
    pub fn new(settings: Settings, dry_run: bool) -> Self {
        let data = DataDir::new(settings.data_dir.clone());
        Self {
            settings,
            data,
            dry_run,
        }
    }

    fn google_auth(&self) -> anyhow::Result<Arc<GoogleAuth>> {
        Ok(Arc::new(GoogleAuth::from_settings(&self.settings)?))
    }
}

pub async fn discover(ctx: &Ctx) -> anyhow::Result<()> {
    let search = YoutubeSearch::from_settings(&ctx.settings)?;
    let videos = pipeline::discover(
        &search,
        &ctx.settings.search_queries,
        chrono::Utc::now(),
        kst::window_hours_from_env(),
    )
    .await?;

    ctx.data.save_videos(&videos).await?;
    tracing::info!(videos = videos.len(), dir = %ctx.data.root().display(), "videos saved");
    Ok(())
}

/// `None` when there was nothing to analyze.
pub async fn extract(ctx: &Ctx) -> anyhow::Result<Option<ExtractReport>> {
    let Some(videos) = ctx.data.load_videos().await? else {
        tracing::info!("no saved videos; skipping extraction");
        return Ok(None);
    };

    let gemini = GeminiClient::from_settings(&ctx.settings)?;
    let transcripts = YoutubeTranscripts::new()?;
    let extractor = Extractor::new(&gemini);

    let report = pipeline::extract_all(
        &extractor,
        &transcripts,
        &videos,
        pipeline::extract_delay_from_env(),
    )
    .await;

    ctx.data.save_recommendations(&report.recommendations).await?;
    Ok(Some(report))
}

/// Publishes saved recommendations. `status` overrides the status derived
/// from saved files.
pub async fn slides(ctx: &Ctx, status: Option<RunStatus>) -> anyhow::Result<()> {
    let Some(records) = ctx.data.load_recommendations().await? else {
        tracing::info!("no saved recommendations; skipping slides");
        return Ok(());
    };

    let status = match status {
        Some(status) => status,
        None => {
            let videos = ctx.data.load_videos().await?.map_or(0, |v| v.len());
            pipeline::run_status(videos, 0, records.len())
        }
    };
    let now = kst::now_kst(chrono::Utc::now())?;
    let specs = pipeline::plan_run(&records, now, &ctx.settings.search_queries, status);

    if ctx.dry_run {
        for spec in &specs {
            tracing::info!(
                object_id = %spec.object_id,
                kind = ?spec.kind,
                index = spec.insertion_index,
                title = %spec.title_text,
                "planned slide (dry-run)"
            );
        }
        return Ok(());
    }

    let renderer = GoogleSlides::new(ctx.google_auth()?)?;
    let (link, report) = pipeline::publish_run(
        &renderer,
        &ctx.data,
        &specs,
        DEFAULT_DECK_TITLE,
        DEFAULT_MAX_SUMMARIES,
    )
    .await?;

    tracing::info!(
        url = %link.url,
        created = report.created.len(),
        deleted = report.deleted.len(),
        "deck updated"
    );
    Ok(())
}

pub async fn email(ctx: &Ctx) -> anyhow::Result<()> {
    let Some(link) = ctx.data.load_deck_link().await? else {
        tracing::info!("no saved deck link; skipping email");
        return Ok(());
    };
    let Some(recipient) = ctx.settings.recipient_email.as_deref() else {
        tracing::warn!("RECIPIENT_EMAIL not set; skipping email");
        return Ok(());
    };

    let date = kst::now_kst(chrono::Utc::now())?.format("%Y-%m-%d").to_string();
    let mail = notify::digest(&link, &date);
    if ctx.dry_run {
        tracing::info!(to = recipient, subject = %mail.subject, "email (dry-run)");
        return Ok(());
    }

    let notifier = GmailNotifier::new(ctx.google_auth()?)?;
    let message_id = notifier
        .send(recipient, &mail.subject, &mail.body)
        .await
        .context("failed to send digest email")?;
    tracing::info!(to = recipient, %message_id, "email sent");
    Ok(())
}

pub async fn run_all(ctx: &Ctx) -> anyhow::Result<()> {
    discover(ctx).await?;
    let status = extract(ctx).await?.map(|report| report.status());
    slides(ctx, status).await?;
    email(ctx).await
}

use crate::error::PipelineError;
use crate::slides::layout::{SlideSpec, SlideStyle};
use crate::slides::retention;
use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DECK_TITLE: &str = "YouTube Stock Picks";

/// The deck all runs accumulate into. Persisted between stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckLink {
    pub id: String,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    pub title_id: Option<String>,
    pub body_id: Option<String>,
}

/// Slide-deck rendering capability.
#[async_trait::async_trait]
pub trait DeckRenderer: Send + Sync {
    async fn create_presentation(&self, title: &str) -> anyhow::Result<DeckLink>;

    /// Fails with `PipelineError::DeckNotFound` when `deck_id` is gone.
    async fn ensure_exists(&self, deck_id: &str) -> anyhow::Result<()>;

    /// Creates an empty title+body slide at `spec.insertion_index`; returns its id.
    async fn create_slide(&self, deck_id: &str, spec: &SlideSpec) -> anyhow::Result<String>;

    async fn placeholders(&self, deck_id: &str, slide_id: &str) -> anyhow::Result<Placeholders>;

    async fn insert_text(&self, deck_id: &str, object_id: &str, text: &str) -> anyhow::Result<()>;

    async fn update_style(
        &self,
        deck_id: &str,
        slide_id: &str,
        placeholders: &Placeholders,
        style: &SlideStyle,
    ) -> anyhow::Result<()>;

    /// Slide object ids in top-to-bottom order.
    async fn list_slides(&self, deck_id: &str) -> anyhow::Result<Vec<String>>;

    async fn delete_slides(&self, deck_id: &str, object_ids: &[String]) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct OpenedDeck {
    pub link: DeckLink,
    /// Slides a freshly created presentation came with; removed after publishing.
    pub placeholder_slides: Vec<String>,
}

/// Reuses the saved deck if it still exists, otherwise creates a new one.
pub async fn open_deck(
    renderer: &dyn DeckRenderer,
    saved: Option<DeckLink>,
    title: &str,
) -> anyhow::Result<OpenedDeck> {
    if let Some(link) = saved {
        match renderer.ensure_exists(&link.id).await {
            Ok(()) => {
                tracing::info!(deck_id = %link.id, "reusing existing deck");
                return Ok(OpenedDeck {
                    link,
                    placeholder_slides: Vec::new(),
                });
            }
            Err(err) => {
                let not_found = matches!(
                    err.downcast_ref::<PipelineError>(),
                    Some(PipelineError::DeckNotFound { .. })
                );
                if !not_found {
                    return Err(err.context("failed to open saved deck"));
                }
                tracing::warn!(deck_id = %link.id, "saved deck no longer exists; creating a new one");
            }
        }
    }

    let link = renderer
        .create_presentation(title)
        .await
        .context("failed to create presentation")?;
    let placeholder_slides = renderer.list_slides(&link.id).await?;
    tracing::info!(deck_id = %link.id, url = %link.url, "created new deck");
    Ok(OpenedDeck {
        link,
        placeholder_slides,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub created: Vec<String>,
    pub deleted: Vec<String>,
}

/// Renders `specs` in order, then applies the retention policy.
pub async fn publish(
    renderer: &dyn DeckRenderer,
    deck: &OpenedDeck,
    specs: &[SlideSpec],
    max_summaries: usize,
) -> anyhow::Result<PublishReport> {
    let deck_id = deck.link.id.as_str();
    let mut report = PublishReport::default();

    for spec in specs {
        let slide_id = renderer
            .create_slide(deck_id, spec)
            .await
            .with_context(|| format!("failed to create slide {}", spec.object_id))?;
        let placeholders = renderer.placeholders(deck_id, &slide_id).await?;

        match &placeholders.title_id {
            Some(title_id) => renderer.insert_text(deck_id, title_id, &spec.title_text).await?,
            None => tracing::warn!(slide_id = %slide_id, "slide has no title placeholder"),
        }
        match &placeholders.body_id {
            Some(body_id) => renderer.insert_text(deck_id, body_id, &spec.body_text).await?,
            None => tracing::warn!(slide_id = %slide_id, "slide has no body placeholder"),
        }
        renderer
            .update_style(deck_id, &slide_id, &placeholders, &spec.style)
            .await?;

        tracing::debug!(
            slide_id = %slide_id,
            kind = ?spec.kind,
            index = spec.insertion_index,
            "slide rendered"
        );
        report.created.push(slide_id);
    }

    if !deck.placeholder_slides.is_empty() {
        renderer
            .delete_slides(deck_id, &deck.placeholder_slides)
            .await
            .context("failed to remove default slides from new deck")?;
        report.deleted.extend(deck.placeholder_slides.iter().cloned());
    }

    let slides = renderer.list_slides(deck_id).await?;
    let expired = retention::trim(&slides, max_summaries);
    if !expired.is_empty() {
        tracing::info!(deck_id, deleting = expired.len(), max_summaries, "applying retention policy");
        renderer
            .delete_slides(deck_id, &expired)
            .await
            .context("failed to delete expired slides")?;
        report.deleted.extend(expired);
    }

    Ok(report)
}

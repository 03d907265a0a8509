use std::fmt;

/// Recoverable pipeline conditions. Callers recover these with
/// `anyhow::Error::downcast_ref` and pick a fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// No transcript could be fetched; analysis falls back to title/tags/description.
    TranscriptUnavailable { video_id: String, detail: String },
    /// A record lacks `stock_name` or `market` and is dropped before grouping.
    ValidationMissingField {
        video_id: String,
        field: &'static str,
    },
    /// The deck referenced by the saved link no longer exists.
    DeckNotFound { deck_id: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::TranscriptUnavailable { video_id, detail } => {
                write!(f, "transcript unavailable (video_id={video_id}): {detail}")
            }
            PipelineError::ValidationMissingField { video_id, field } => {
                write!(f, "recommendation missing {field} (video_id={video_id})")
            }
            PipelineError::DeckNotFound { deck_id } => {
                write!(f, "deck not found (deck_id={deck_id})")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

pub mod retry;

use crate::domain::contract::Provenance;
use crate::domain::recommendation::Recommendation;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json::parse_recommendations;
use crate::llm::TextGenerator;
use retry::{retry, RetryPolicy};

/// Upper bound on analyzed characters per video. Applied before the prompt
/// is built.
pub const MAX_INPUT_CHARS: usize = 30_000;

/// Turns one video's text into recommendation records.
pub struct Extractor<'a> {
    generator: &'a dyn TextGenerator,
    retry_policy: RetryPolicy,
    max_input_chars: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self {
            generator,
            retry_policy: RetryPolicy::default(),
            max_input_chars: MAX_INPUT_CHARS,
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Never fails: generation errors and unusable output are logged and
    /// produce an empty list. Records are returned unvalidated.
    pub async fn extract(&self, content_text: &str, source: &Provenance<'_>) -> Vec<Recommendation> {
        match self.try_extract(content_text, source).await {
            Ok(recs) => recs,
            Err(err) => {
                let rate_limited = err
                    .downcast_ref::<LlmDiagnosticsError>()
                    .is_some_and(LlmDiagnosticsError::is_rate_limited);
                tracing::error!(
                    video_id = source.video_id,
                    rate_limited,
                    error = %err,
                    "generation failed; skipping video"
                );
                Vec::new()
            }
        }
    }

    /// Like [`Extractor::extract`] but surfaces generation failures (after
    /// retries) to the caller. Unusable output is still an empty `Ok`.
    pub async fn try_extract(
        &self,
        content_text: &str,
        source: &Provenance<'_>,
    ) -> anyhow::Result<Vec<Recommendation>> {
        let clipped = clip_chars(content_text, self.max_input_chars);
        if clipped.len() < content_text.len() {
            tracing::debug!(
                video_id = source.video_id,
                max_chars = self.max_input_chars,
                "input text truncated before generation"
            );
        }

        let prompt = build_prompt(clipped, source.video_title);
        let schema = response_schema();
        let provider = self.generator.provider();

        let text = retry(&self.retry_policy, |attempt| {
            tracing::debug!(video_id = source.video_id, attempt, "sending generation request");
            self.generator.generate(&prompt, &schema)
        })
        .await?;

        match parse_recommendations(provider, &text) {
            Ok(parsed) => Ok(parsed
                .recommendations
                .into_iter()
                .map(|item| item.into_recommendation(source))
                .collect()),
            Err(err) => {
                tracing::warn!(
                    video_id = source.video_id,
                    error = %err,
                    raw_output = err.raw_output.as_deref().unwrap_or_default(),
                    "generation output unusable; treating as no recommendations"
                );
                Ok(Vec::new())
            }
        }
    }
}

/// Prefix of `text` holding at most `max_chars` characters.
pub fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn build_prompt(text: &str, video_title: &str) -> String {
    format!(
        "Analyze the following YouTube video content titled \"{video_title}\".\n\
Identify any specific investment recommendations for US or Korean stocks.\n\n\
Structure your answer strictly as a JSON object with a key \"recommendations\" which is a list of objects.\n\
Each object in the list must have:\n\
- \"stock_name\": Name of the stock\n\
- \"market\": \"US\" or \"KR\"\n\
- \"speaker\": Who is recommending. Write Korean names in Hangeul (e.g. \"김동환\"). Use \"Analyst\" if unknown.\n\
- \"action\": one of \"Buy\", \"Sell\", \"Hold\", \"Wait\", \"Watch\"\n\
- \"reasoning\": Why they recommend it (brief summary)\n\
- \"time_context\": approximate time in video or \"General\"\n\n\
If there are no clear recommendations, return {{\"recommendations\": []}}.\n\n\
Content:\n{text}"
    )
}

fn response_schema() -> serde_json::Value {
    let field = serde_json::json!({"type": "STRING"});
    serde_json::json!({
        "type": "OBJECT",
        "required": ["recommendations"],
        "properties": {
            "recommendations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "required": ["stock_name", "market", "action"],
                    "properties": {
                        "stock_name": field,
                        "market": {"type": "STRING", "enum": ["US", "KR"]},
                        "speaker": field,
                        "action": {"type": "STRING", "enum": ["Buy", "Sell", "Hold", "Wait", "Watch"]},
                        "reasoning": field,
                        "time_context": field,
                    }
                }
            }
        }
    })
}

use crate::domain::recommendation::{
    Action, Market, Recommendation, SourceType, DEFAULT_SPEAKER, DEFAULT_TIME_CONTEXT,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level JSON object the model is asked to emit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRecommendationResponse {
    #[serde(default)]
    pub recommendations: Vec<LlmRecommendationItem>,
}

/// One entry of `recommendations`. Every field is optional on the wire;
/// required-field checks happen downstream at grouping time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRecommendationItem {
    #[serde(default)]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub time_context: Option<String>,
}

/// Video-level fields attached to every record from one extraction call.
#[derive(Debug, Clone)]
pub struct Provenance<'a> {
    pub video_id: &'a str,
    pub video_title: &'a str,
    pub source_type: SourceType,
}

impl LlmRecommendationItem {
    /// Reads one `recommendations` entry field by field. A field of the wrong
    /// JSON type is coerced to text (or left empty), never rejected.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let field = |key: &str| obj.get(key).and_then(loose_string);
        Self {
            stock_name: field("stock_name"),
            market: field("market"),
            speaker: field("speaker"),
            action: field("action"),
            reasoning: field("reasoning"),
            time_context: field("time_context"),
        }
    }

    pub fn into_recommendation(self, provenance: &Provenance<'_>) -> Recommendation {
        Recommendation {
            stock_name: trimmed(self.stock_name).unwrap_or_default(),
            market: Market::from(self.market.unwrap_or_default()),
            speaker: trimmed(self.speaker).unwrap_or_else(|| DEFAULT_SPEAKER.to_string()),
            action: Action::from(self.action.unwrap_or_default()),
            reasoning: trimmed(self.reasoning).unwrap_or_default(),
            time_context: trimmed(self.time_context)
                .unwrap_or_else(|| DEFAULT_TIME_CONTEXT.to_string()),
            video_title: provenance.video_title.to_string(),
            video_id: provenance.video_id.to_string(),
            source_type: provenance.source_type,
        }
    }
}

fn loose_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(loose_string).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn trimmed(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

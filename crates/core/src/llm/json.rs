use crate::domain::contract::{LlmRecommendationItem, LlmRecommendationResponse};
use crate::llm::error::{LlmDiagnosticsError, LlmErrorKind};
use crate::llm::Provider;
use serde_json::Value;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

/// Parses model output into the `{"recommendations": [...]}` contract.
///
/// Text that is not JSON at all is `Malformed`. Valid JSON of any other shape
/// (array, scalar, object without the key, key not holding an array) yields an
/// empty response. Individual entries that are not objects are skipped.
pub fn parse_recommendations(
    provider: Provider,
    text: &str,
) -> Result<LlmRecommendationResponse, LlmDiagnosticsError> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let value = serde_json::from_str::<Value>(&json_str).map_err(|err| LlmDiagnosticsError {
        provider,
        kind: LlmErrorKind::Malformed,
        stage: "parse",
        detail: format!("LLM output is not valid JSON: {err}"),
        raw_output: Some(text.to_string()),
        raw_response_json: None,
    })?;

    let Some(entries) = value.get("recommendations").and_then(Value::as_array) else {
        tracing::debug!("LLM output has no recommendations array; treating as empty");
        return Ok(LlmRecommendationResponse::default());
    };

    let mut recommendations = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        match entry.as_object() {
            Some(obj) => recommendations.push(LlmRecommendationItem::from_object(obj)),
            None => tracing::debug!(idx, "skipping non-object recommendation entry"),
        }
    }

    Ok(LlmRecommendationResponse { recommendations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body.to_string()));
    }

    #[test]
    fn extract_json_falls_back_to_braces() {
        let s = "prefix {\"a\":1} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn parses_recommendations_array() {
        let text = json!({
            "recommendations": [
                {"stock_name": "Nvidia", "market": "US", "action": "Buy"},
                {"stock_name": "삼성전자", "market": "KR", "action": "Hold", "speaker": "김동환"},
            ]
        })
        .to_string();

        let parsed = parse_recommendations(Provider::Gemini, &text).unwrap();
        assert_eq!(parsed.recommendations.len(), 2);
        assert_eq!(parsed.recommendations[1].speaker.as_deref(), Some("김동환"));
    }

    #[test]
    fn missing_key_is_empty_not_error() {
        let text = json!({"picks": [{"stock_name": "Nvidia"}]}).to_string();
        let parsed = parse_recommendations(Provider::Gemini, &text).unwrap();
        assert!(parsed.recommendations.is_empty());
    }

    #[test]
    fn other_shapes_are_empty() {
        for text in ["[]", "[{\"stock_name\":\"x\"}]", "{\"recommendations\": \"none\"}"] {
            let parsed = parse_recommendations(Provider::Gemini, text).unwrap();
            assert!(parsed.recommendations.is_empty(), "input: {text}");
        }
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_recommendations(Provider::Gemini, "I could not find any stocks.")
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Malformed);
        assert_eq!(err.raw_output.as_deref(), Some("I could not find any stocks."));
    }

    #[test]
    fn skips_non_object_entries() {
        let text = "{\"recommendations\": [1, {\"stock_name\": \"Tesla\", \"market\": \"US\"}]}";
        let parsed = parse_recommendations(Provider::Gemini, text).unwrap();
        assert_eq!(parsed.recommendations.len(), 1);
        assert_eq!(parsed.recommendations[0].stock_name.as_deref(), Some("Tesla"));
    }

    #[test]
    fn keeps_entries_with_mistyped_optional_fields() {
        let text = json!({
            "recommendations": [{
                "stock_name": "Nvidia",
                "market": "US",
                "action": "Buy",
                "speaker": ["Kim", "Lee"],
                "time_context": 12
            }]
        })
        .to_string();

        let parsed = parse_recommendations(Provider::Gemini, &text).unwrap();
        assert_eq!(parsed.recommendations.len(), 1);
        let item = &parsed.recommendations[0];
        assert_eq!(item.stock_name.as_deref(), Some("Nvidia"));
        assert_eq!(item.market.as_deref(), Some("US"));
        assert_eq!(item.speaker.as_deref(), Some("Kim, Lee"));
        assert_eq!(item.time_context.as_deref(), Some("12"));
    }
}

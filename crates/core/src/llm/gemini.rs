use crate::config::Settings;
use crate::llm::error::{LlmDiagnosticsError, LlmErrorKind};
use crate::llm::{Provider, TextGenerator};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const RESPONSE_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    async fn generate_content(
        &self,
        req: GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .map_err(|err| LlmDiagnosticsError {
                provider: Provider::Gemini,
                kind: LlmErrorKind::Fatal,
                stage: "send",
                detail: err.to_string(),
                raw_output: None,
                raw_response_json: None,
            })?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            let kind = classify_status(status, raw_response_json.as_ref());
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                kind,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        serde_json::from_str::<GenerateContentResponse>(&text).map_err(|err| {
            LlmDiagnosticsError {
                provider: Provider::Gemini,
                kind: LlmErrorKind::Fatal,
                stage: "decode",
                detail: format!("failed to decode generateContent response: {err}"),
                raw_output: Some(text),
                raw_response_json: None,
            }
            .into()
        })
    }

    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        let candidate = res.candidates.first()?;
        let mut out = String::new();
        for part in &candidate.content.parts {
            if let Some(text) = &part.text {
                out.push_str(text);
            }
        }
        if out.trim().is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

fn classify_status(status: StatusCode, body: Option<&serde_json::Value>) -> LlmErrorKind {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return LlmErrorKind::RateLimited;
    }

    let exhausted = body
        .and_then(|v| v.pointer("/error/status"))
        .and_then(|v| v.as_str())
        .is_some_and(|s| s == "RESOURCE_EXHAUSTED");
    if exhausted {
        LlmErrorKind::RateLimited
    } else {
        LlmErrorKind::Fatal
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(
        &self,
        prompt: &str,
        response_schema: &serde_json::Value,
    ) -> anyhow::Result<String> {
        let req = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
                response_schema: response_schema.clone(),
            },
        };

        let res = self.generate_content(req).await?;
        match Self::response_text(&res) {
            Some(text) => Ok(text),
            None => {
                // Blocked prompts come back with no candidates; treat like "no picks".
                tracing::warn!(
                    model = %self.model,
                    block_reason = ?res.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()),
                    "Gemini returned no text; treating as empty output"
                );
                Ok(String::from("{\"recommendations\": []}"))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,

    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

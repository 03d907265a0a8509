pub mod error;
pub mod gemini;
pub mod json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

/// Text-in, text-out generation capability. Built once per run and passed
/// explicitly to whatever needs it.
///
/// Implementations return `LlmDiagnosticsError` (inside `anyhow::Error`) so
/// callers can tell rate limiting apart from other failures.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(
        &self,
        prompt: &str,
        response_schema: &serde_json::Value,
    ) -> anyhow::Result<String>;
}

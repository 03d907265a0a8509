use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// HTTP 429 or a quota-exhausted status; worth retrying after a pause.
    RateLimited,
    /// The model answered, but not with parseable JSON.
    Malformed,
    /// Anything else. Not retried.
    Fatal,
}

#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub kind: LlmErrorKind,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub fn is_rate_limited(&self) -> bool {
        self.kind == LlmErrorKind::RateLimited
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={:?}, kind={:?}, stage={}): {}",
            self.provider, self.kind, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}

/// Classifies an arbitrary generation failure. Errors that did not come from
/// a provider adapter (e.g. transport failures wrapped by `anyhow`) are fatal.
pub fn error_kind(err: &anyhow::Error) -> LlmErrorKind {
    err.downcast_ref::<LlmDiagnosticsError>()
        .map(|d| d.kind)
        .unwrap_or(LlmErrorKind::Fatal)
}

pub mod auth;
pub mod gmail;
pub mod slides;
pub mod youtube;

use anyhow::Context;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GoogleHttpError {
    pub api: &'static str,
    pub status: StatusCode,
    pub body: String,
}

impl fmt::Display for GoogleHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} HTTP {}: {}", self.api, self.status, self.body)
    }
}

impl std::error::Error for GoogleHttpError {}

pub(crate) fn http_client(env_key: &str) -> anyhow::Result<reqwest::Client> {
    let timeout_secs = std::env::var(env_key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build Google http client")
}

/// Sends `req` and decodes a successful JSON body. Non-2xx responses become
/// `GoogleHttpError` so callers can branch on the status.
pub(crate) async fn send_json<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
    api: &'static str,
) -> anyhow::Result<T> {
    let res = req
        .send()
        .await
        .with_context(|| format!("{api} request failed"))?;

    let status = res.status();
    let text = res
        .text()
        .await
        .with_context(|| format!("failed to read {api} response"))?;
    if !status.is_success() {
        return Err(GoogleHttpError {
            api,
            status,
            body: text,
        }
        .into());
    }

    serde_json::from_str::<T>(&text)
        .with_context(|| format!("failed to parse {api} response: {text}"))
}

pub(crate) fn http_status(err: &anyhow::Error) -> Option<StatusCode> {
    err.downcast_ref::<GoogleHttpError>().map(|e| e.status)
}

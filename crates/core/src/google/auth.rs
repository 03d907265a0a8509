use crate::config::Settings;
use crate::google::{http_client, send_json};
use anyhow::Context;
use serde::{Deserialize, Serialize};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
// Refresh this long before Google's stated expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth2 refresh-token grant shared by the Slides and Gmail adapters.
pub struct GoogleAuth {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_cache: tokio::sync::Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: AccessToken,
    fetched_at: chrono::DateTime<chrono::Utc>,
}

impl GoogleAuth {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let (client_id, client_secret, refresh_token) = settings.require_google_oauth()?;
        Ok(Self {
            http: http_client("GOOGLE_TIMEOUT_SECS")?,
            token_url: std::env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| TOKEN_URL.to_string()),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
            token_cache: tokio::sync::Mutex::new(None),
        })
    }

    /// Bearer token for API calls, refreshed when missing or near expiry.
    pub async fn access_token(&self) -> anyhow::Result<String> {
        let mut guard = self.token_cache.lock().await;
        if let Some(cached) = guard.as_ref() {
            if !cached.token.is_stale(cached.fetched_at, chrono::Utc::now()) {
                return Ok(cached.token.access_token.clone());
            }
        }

        let fetched_at = chrono::Utc::now();
        let token = self.refresh().await?;
        tracing::debug!(expires_in = token.expires_in, "refreshed Google access token");
        let access_token = token.access_token.clone();
        *guard = Some(CachedToken { token, fetched_at });
        Ok(access_token)
    }

    async fn refresh(&self) -> anyhow::Result<AccessToken> {
        let form = RefreshRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            refresh_token: &self.refresh_token,
            grant_type: "refresh_token",
        };
        send_json::<AccessToken>(self.http.post(&self.token_url).form(&form), "Google OAuth")
            .await
            .context("failed to refresh Google access token")
    }
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct AccessToken {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

impl AccessToken {
    fn is_stale(
        &self,
        fetched_at: chrono::DateTime<chrono::Utc>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> bool {
        if self.expires_in == 0 {
            return true;
        }
        let expires_at = fetched_at + chrono::Duration::seconds(self.expires_in as i64);
        now + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) >= expires_at
    }
}

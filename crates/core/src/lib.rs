pub mod domain;
pub mod error;
pub mod extract;
pub mod google;
pub mod group;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod slides;
pub mod storage;
pub mod time;
pub mod transcript;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_DATA_DIR: &str = ".tmp";
    const DEFAULT_SEARCH_QUERIES: [&str; 3] = ["삼프로TV", "언더스탠딩", "와이스트릿"];

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub youtube_api_key: Option<String>,
        pub google_client_id: Option<String>,
        pub google_client_secret: Option<String>,
        pub google_refresh_token: Option<String>,
        pub recipient_email: Option<String>,
        pub sentry_dsn: Option<String>,
        pub data_dir: PathBuf,
        pub search_queries: Vec<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                gemini_api_key: non_empty_var("GEMINI_API_KEY"),
                youtube_api_key: non_empty_var("YOUTUBE_API_KEY"),
                google_client_id: non_empty_var("GOOGLE_CLIENT_ID"),
                google_client_secret: non_empty_var("GOOGLE_CLIENT_SECRET"),
                google_refresh_token: non_empty_var("GOOGLE_REFRESH_TOKEN"),
                recipient_email: non_empty_var("RECIPIENT_EMAIL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                data_dir: non_empty_var("SAMPRO_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
                search_queries: parse_search_queries(std::env::var("SEARCH_QUERIES").ok()),
            })
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        pub fn require_youtube_api_key(&self) -> anyhow::Result<&str> {
            self.youtube_api_key
                .as_deref()
                .context("YOUTUBE_API_KEY is required")
        }

        pub fn require_google_oauth(&self) -> anyhow::Result<(&str, &str, &str)> {
            let client_id = self
                .google_client_id
                .as_deref()
                .context("GOOGLE_CLIENT_ID is required")?;
            let client_secret = self
                .google_client_secret
                .as_deref()
                .context("GOOGLE_CLIENT_SECRET is required")?;
            let refresh_token = self
                .google_refresh_token
                .as_deref()
                .context("GOOGLE_REFRESH_TOKEN is required")?;
            Ok((client_id, client_secret, refresh_token))
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Comma-separated override for the channel search queries.
    pub fn parse_search_queries(v: Option<String>) -> Vec<String> {
        let parsed: Vec<String> = v
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if parsed.is_empty() {
            DEFAULT_SEARCH_QUERIES.iter().map(|s| s.to_string()).collect()
        } else {
            parsed
        }
    }

}

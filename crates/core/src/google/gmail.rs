use crate::google::auth::GoogleAuth;
use crate::google::{http_client, send_json};
use crate::notify::Notifier;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com";
const MIME_LINE_LEN: usize = 76;

/// Sends mail as the authorized user through the Gmail REST API.
pub struct GmailNotifier {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    base_url: String,
}

impl GmailNotifier {
    pub fn new(auth: Arc<GoogleAuth>) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client("GOOGLE_TIMEOUT_SECS")?,
            auth,
            base_url: std::env::var("GMAIL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for GmailNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<String> {
        let token = self.auth.access_token().await?;
        let url = format!(
            "{}/gmail/v1/users/me/messages/send",
            self.base_url.trim_end_matches('/')
        );
        let raw = URL_SAFE.encode(rfc2822_message(to, subject, body));
        let req = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&SendRequest { raw: &raw });
        let sent: SendResponse = send_json(req, "Gmail").await?;
        Ok(sent.id)
    }
}

/// Plain-text UTF-8 message with an RFC 2047 encoded subject.
fn rfc2822_message(to: &str, subject: &str, body: &str) -> String {
    let encoded_body = STANDARD.encode(body.as_bytes());
    let wrapped: Vec<String> = encoded_body
        .as_bytes()
        .chunks(MIME_LINE_LEN)
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect();

    format!(
        "To: {to}\r\n\
         Subject: {}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: text/plain; charset=\"UTF-8\"\r\n\
         Content-Transfer-Encoding: base64\r\n\
         \r\n\
         {}\r\n",
        encode_header(subject),
        wrapped.join("\r\n")
    )
}

fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

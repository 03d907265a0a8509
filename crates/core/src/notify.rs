use crate::slides::publish::DeckLink;

/// Outbound notification capability.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a plain-text message; returns the provider's message id.
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEmail {
    pub subject: String,
    pub body: String,
}

/// Daily digest pointing at the deck. `date` is the KST run date.
pub fn digest(link: &DeckLink, date: &str) -> DigestEmail {
    DigestEmail {
        subject: format!("Stock Analysis: {} ({date})", link.title),
        body: format!(
            "Here is today's stock analysis from the tracked YouTube channels.\n\n{}\n\nNewest run is at the top of the deck.",
            link.url
        ),
    }
}

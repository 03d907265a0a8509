use serde::{Deserialize, Serialize};

/// One discovered video. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(rename = "channelTitle", default)]
    pub channel_title: String,
}

impl ContentItem {
    /// Analysis input used when no transcript is available.
    pub fn fallback_text(&self) -> String {
        format!(
            "Title: {}\nTags: {}\nDescription: {}",
            self.title,
            self.tags.join(", "),
            self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_text_joins_title_tags_and_description() {
        let item: ContentItem = serde_json::from_value(json!({
            "id": "foqCjCwvpNo",
            "title": "코스닥 3000은 풀악셀",
            "description": "00:00 코스닥 3000은 풀악셀",
            "tags": ["삼성전자", "SK하이닉스"],
            "publishedAt": "2026-10-18T01:00:00Z",
        }))
        .unwrap();

        assert_eq!(
            item.fallback_text(),
            "Title: 코스닥 3000은 풀악셀\nTags: 삼성전자, SK하이닉스\nDescription: 00:00 코스닥 3000은 풀악셀"
        );
        assert!(item.channel_title.is_empty());
    }
}

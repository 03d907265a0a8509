use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SPEAKER: &str = "Analyst";
pub const DEFAULT_TIME_CONTEXT: &str = "General";

/// One suggested trading action extracted from one video.
///
/// Records are stored as extracted; `stock_name` and `market` are only
/// guaranteed non-empty after [`Recommendation::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub stock_name: String,
    #[serde(default)]
    pub market: Market,
    #[serde(default = "default_speaker")]
    pub speaker: String,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "default_time_context")]
    pub time_context: String,
    #[serde(default)]
    pub video_title: String,
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub source_type: SourceType,
}

fn default_speaker() -> String {
    DEFAULT_SPEAKER.to_string()
}

fn default_time_context() -> String {
    DEFAULT_TIME_CONTEXT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Market {
    Us,
    Kr,
    /// Anything the model produced that is not US/KR. Empty means missing.
    Other(String),
    #[default]
    Missing,
}

impl Market {
    pub fn as_str(&self) -> &str {
        match self {
            Market::Us => "US",
            Market::Kr => "KR",
            Market::Other(s) => s,
            Market::Missing => "",
        }
    }

    pub fn is_missing(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<String> for Market {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "" => Market::Missing,
            "US" | "USA" => Market::Us,
            "KR" | "KOR" | "KOREA" => Market::Kr,
            _ => Market::Other(trimmed.to_string()),
        }
    }
}

impl From<Market> for String {
    fn from(m: Market) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Buy,
    Sell,
    Hold,
    Wait,
    Watch,
    Other(String),
    #[default]
    Unspecified,
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Buy => "Buy",
            Action::Sell => "Sell",
            Action::Hold => "Hold",
            Action::Wait => "Wait",
            Action::Watch => "Watch",
            Action::Other(s) => s,
            Action::Unspecified => "",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Action::Buy => "🚀",
            Action::Sell => "📉",
            Action::Hold => "⚖️",
            Action::Wait => "⏳",
            Action::Watch => "👀",
            Action::Other(_) | Action::Unspecified => "📌",
        }
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Action::Unspecified,
            "buy" => Action::Buy,
            "sell" => Action::Sell,
            "hold" => Action::Hold,
            "wait" => Action::Wait,
            "watch" => Action::Watch,
            _ => Action::Other(trimmed.to_string()),
        }
    }
}

impl From<Action> for String {
    fn from(a: Action) -> Self {
        a.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the analyzed text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceType {
    #[default]
    Transcript,
    #[serde(rename = "Tags/Description")]
    TagsDescription,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Transcript => "Transcript",
            SourceType::TagsDescription => "Tags/Description",
        }
    }
}

impl Recommendation {
    /// Returns the name of the first required field that is blank.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.stock_name.trim().is_empty() {
            return Some("stock_name");
        }
        if self.market.is_missing() {
            return Some("market");
        }
        None
    }
}

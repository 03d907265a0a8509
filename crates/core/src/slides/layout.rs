use crate::domain::recommendation::Recommendation;
use crate::group::{OrderedMap, RecommendationGroup};
use crate::time::kst;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

pub const MAX_ITEMS_PER_SLIDE: usize = 5;
pub const MAX_TITLE_CHARS: usize = 70;
pub const MAX_REASONING_CHARS: usize = 110;
pub const ELLIPSIS: &str = "...";

/// Object id prefix that marks one run's summary slide.
pub const SUMMARY_PREFIX: &str = "summary_";

const NO_DATA_TITLE: &str = "📭 No recommendations today";
const NO_DATA_BODY: &str = "No stock recommendations were found in today's videos.";

/// Summary slides go to the very top of the deck; everything else of the same
/// run is inserted right below it.
const SUMMARY_INSERTION_INDEX: usize = 0;
const BODY_INSERTION_INDEX: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlideKind {
    Summary,
    NoData,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn hex(v: u32) -> Self {
        Self {
            r: ((v >> 16) & 0xFF) as u8,
            g: ((v >> 8) & 0xFF) as u8,
            b: (v & 0xFF) as u8,
        }
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

pub const BACKGROUND: Rgb = Rgb::hex(0x1E1E2E);
pub const ACCENT: Rgb = Rgb::hex(0xF9C74F);
pub const BODY_GRAY: Rgb = Rgb::hex(0xD9D9D9);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlideStyle {
    pub background: Rgb,
    pub title_color: Rgb,
    pub body_color: Rgb,
    pub title_font_pt: f32,
    pub body_font_pt: f32,
    pub title_bold: bool,
}

impl SlideStyle {
    pub fn summary() -> Self {
        Self {
            background: BACKGROUND,
            title_color: ACCENT,
            body_color: BODY_GRAY,
            title_font_pt: 36.0,
            body_font_pt: 14.0,
            title_bold: true,
        }
    }

    pub fn content() -> Self {
        Self {
            background: BACKGROUND,
            title_color: ACCENT,
            body_color: BODY_GRAY,
            title_font_pt: 16.0,
            body_font_pt: 10.0,
            title_bold: true,
        }
    }
}

/// A planned, not yet rendered deck page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideSpec {
    pub object_id: String,
    pub kind: SlideKind,
    pub insertion_index: usize,
    pub title_text: String,
    pub body_text: String,
    pub style: SlideStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Success { videos: usize, recommendations: usize },
    NoRecommendations { videos: usize },
    Failed { reason: String },
}

impl RunStatus {
    fn describe(&self) -> String {
        match self {
            RunStatus::Success {
                videos,
                recommendations,
            } => format!("✅ Success: {recommendations} recommendations from {videos} videos"),
            RunStatus::NoRecommendations { videos } => {
                format!("⚠️ No recommendations ({videos} videos analyzed)")
            }
            RunStatus::Failed { reason } => format!("❌ Failed: {reason}"),
        }
    }
}

/// Metadata shown on the summary slide. `now` also seeds object ids.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub now: DateTime<FixedOffset>,
    pub channels: Vec<String>,
    pub status: RunStatus,
}

impl RunInfo {
    /// Run timestamp down to the nanosecond, so two runs in the same second
    /// never share object ids.
    fn stamp(&self) -> String {
        self.now.format("%Y%m%d%H%M%S%f").to_string()
    }
}

/// Plans one run's slides in insertion order.
///
/// Each spec is inserted at its `insertion_index` in emission order. Content
/// slides all land at index 1, right under the summary, so every insert pushes
/// the previous ones down: the emitted sequence is the exact reverse of the
/// final deck order. The final order is newest video (last discovered) first,
/// and page 1 before page 2 within a video, so groups are walked in discovery
/// order and each group's pages from last to first.
pub fn plan(groups: &OrderedMap<String, RecommendationGroup>, run: &RunInfo) -> Vec<SlideSpec> {
    let stamp = run.stamp();
    let mut specs = vec![summary_slide(run, &stamp)];

    if groups.is_empty() {
        specs.push(SlideSpec {
            object_id: format!("nodata_{stamp}"),
            kind: SlideKind::NoData,
            insertion_index: BODY_INSERTION_INDEX,
            title_text: NO_DATA_TITLE.to_string(),
            body_text: NO_DATA_BODY.to_string(),
            style: SlideStyle::content(),
        });
        return specs;
    }

    let mut seq: usize = 0;
    for (video_id, group) in groups.iter() {
        let pages: Vec<_> = group.items.chunks(MAX_ITEMS_PER_SLIDE).collect();
        let total = pages.len();
        let base_title = truncate_with_ellipsis(&group.video_title, MAX_TITLE_CHARS);

        for (page_idx, items) in pages.iter().enumerate().rev() {
            seq += 1;
            let title_text = if total > 1 {
                format!("{base_title} ({}/{total})", page_idx + 1)
            } else {
                base_title.clone()
            };

            tracing::debug!(
                video_id = %video_id,
                page = page_idx + 1,
                total,
                items = items.len(),
                "planned content slide"
            );
            specs.push(SlideSpec {
                object_id: format!("content_{stamp}_{seq:03}"),
                kind: SlideKind::Content,
                insertion_index: BODY_INSERTION_INDEX,
                title_text,
                body_text: content_body(items),
                style: SlideStyle::content(),
            });
        }
    }

    specs
}

fn summary_slide(run: &RunInfo, stamp: &str) -> SlideSpec {
    let body_text = [
        format!("🕘 Generated: {}", kst::format_display(run.now)),
        format!("📺 Channels: {}", run.channels.join(", ")),
        format!("📊 Status: {}", run.status.describe()),
    ]
    .join("\n");

    SlideSpec {
        object_id: format!("{SUMMARY_PREFIX}{stamp}"),
        kind: SlideKind::Summary,
        insertion_index: SUMMARY_INSERTION_INDEX,
        title_text: format!("📅 {} Stock Picks", run.now.format("%Y-%m-%d")),
        body_text,
        style: SlideStyle::summary(),
    }
}

fn content_body(items: &[Recommendation]) -> String {
    let mut blocks = Vec::with_capacity(items.len());
    for rec in items {
        let mut headline = format!("{} {}", rec.action.icon(), rec.stock_name);
        if !rec.market.is_missing() {
            headline.push_str(&format!(" [{}]", rec.market));
        }
        if !rec.action.as_str().is_empty() {
            headline.push_str(&format!(" [{}]", rec.action));
        }

        let reasoning = truncate_with_ellipsis(&rec.reasoning, MAX_REASONING_CHARS);
        blocks.push(format!("{headline}\n    └ {}: {reasoning}", rec.speaker));
    }
    blocks.join("\n\n")
}

/// `text` unchanged if it fits in `max_chars` characters, otherwise its first
/// `max_chars - 3` characters followed by `...`.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recommendation::{Action, Market};
    use crate::group::group;
    use chrono::TimeZone;

    fn rec(video_id: &str, stock: &str) -> Recommendation {
        Recommendation {
            stock_name: stock.to_string(),
            market: Market::Kr,
            speaker: "김동환".to_string(),
            action: Action::Buy,
            reasoning: "실적 개선".to_string(),
            time_context: "General".to_string(),
            video_title: format!("video {video_id}"),
            video_id: video_id.to_string(),
            source_type: Default::default(),
        }
    }

    fn run_info() -> RunInfo {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        RunInfo {
            now: kst.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            channels: vec!["삼프로TV".to_string(), "언더스탠딩".to_string()],
            status: RunStatus::Success {
                videos: 2,
                recommendations: 7,
            },
        }
    }

    /// Applies specs the way the deck does: each one inserted at its index.
    fn rendered_order(specs: &[SlideSpec]) -> Vec<String> {
        let mut deck: Vec<String> = Vec::new();
        for spec in specs {
            let at = spec.insertion_index.min(deck.len());
            deck.insert(at, spec.title_text.clone());
        }
        deck
    }

    #[test]
    fn empty_groups_produce_summary_and_no_data() {
        let specs = plan(&OrderedMap::new(), &run_info());
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].kind, SlideKind::Summary);
        assert_eq!(specs[0].insertion_index, 0);
        assert_eq!(specs[1].kind, SlideKind::NoData);
        assert_eq!(specs[1].insertion_index, 1);
        assert_eq!(specs[1].body_text, NO_DATA_BODY);
    }

    #[test]
    fn insertion_order_renders_newest_video_first() {
        // A has 7 items (2 pages), B has 2 items (1 page); A discovered first.
        let mut records: Vec<_> = (0..7).map(|i| rec("A", &format!("a{i}"))).collect();
        records.extend((0..2).map(|i| rec("B", &format!("b{i}"))));
        let specs = plan(&group(&records), &run_info());

        assert_eq!(specs.len(), 4);
        assert!(specs[1..].iter().all(|s| s.insertion_index == 1));
        assert_eq!(
            rendered_order(&specs),
            vec![
                "📅 2026-10-18 Stock Picks",
                "video B",
                "video A (1/2)",
                "video A (2/2)",
            ]
        );
    }

    #[test]
    fn pages_hold_at_most_five_items_in_order() {
        let records: Vec<_> = (0..12).map(|i| rec("A", &format!("s{i:02}"))).collect();
        let specs = plan(&group(&records), &run_info());
        let content: Vec<_> = specs.iter().filter(|s| s.kind == SlideKind::Content).collect();
        assert_eq!(content.len(), 3);

        // Emitted last page first.
        assert!(content[0].title_text.ends_with("(3/3)"));
        assert_eq!(content[0].body_text.matches("└").count(), 2);
        assert_eq!(content[2].body_text.matches("└").count(), 5);
        let first_page = &content[2].body_text;
        assert!(first_page.find("s00").unwrap() < first_page.find("s04").unwrap());
        assert!(!first_page.contains("s05"));
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let records: Vec<_> = (0..10).map(|i| rec("A", &format!("s{i}"))).collect();
        let specs = plan(&group(&records), &run_info());
        assert_eq!(specs.len(), 3);
        assert!(specs[1].title_text.ends_with("(2/2)"));
    }

    #[test]
    fn object_ids_are_unique_and_deterministic() {
        let mut records: Vec<_> = (0..6).map(|i| rec("A", &format!("a{i}"))).collect();
        records.push(rec("B", "b"));
        let groups = group(&records);
        let specs = plan(&groups, &run_info());
        let again = plan(&groups, &run_info());
        assert_eq!(specs, again);

        let ids: std::collections::HashSet<_> = specs.iter().map(|s| &s.object_id).collect();
        assert_eq!(ids.len(), specs.len());
        assert_eq!(specs[0].object_id, "summary_20261018093000000000000");
        assert!(specs[1].object_id.starts_with("content_20261018093000000000000_"));
    }

    #[test]
    fn runs_within_one_second_get_distinct_ids() {
        let groups = group(&[rec("A", "a")]);
        let first = run_info();
        let mut second = run_info();
        second.now = first.now + chrono::Duration::milliseconds(250);

        let a = plan(&groups, &first);
        let b = plan(&groups, &second);
        assert_ne!(a[0].object_id, b[0].object_id);
        assert_ne!(a[1].object_id, b[1].object_id);
        assert!(b[0].object_id.starts_with(SUMMARY_PREFIX));
        // Slides object ids are limited to 50 characters.
        assert!(a.iter().all(|s| s.object_id.len() <= 50));
    }

    #[test]
    fn truncation_limits() {
        let title = "t".repeat(75);
        let t = truncate_with_ellipsis(&title, MAX_TITLE_CHARS);
        assert_eq!(t.chars().count(), 70);
        assert_eq!(t, format!("{}...", "t".repeat(67)));

        let reasoning = "이".repeat(120);
        let r = truncate_with_ellipsis(&reasoning, MAX_REASONING_CHARS);
        assert_eq!(r.chars().count(), 110);
        assert_eq!(r, format!("{}...", "이".repeat(107)));

        assert_eq!(truncate_with_ellipsis(&"x".repeat(70), MAX_TITLE_CHARS), "x".repeat(70));
        assert_eq!(truncate_with_ellipsis("short", MAX_REASONING_CHARS), "short");
    }

    #[test]
    fn body_lines_show_icon_market_action_and_speaker() {
        let mut sell = rec("A", "Tesla");
        sell.market = Market::Us;
        sell.action = Action::Sell;
        sell.speaker = "Analyst".to_string();
        sell.reasoning = "수요 둔화".to_string();
        let mut odd = rec("A", "에코프로");
        odd.market = Market::Other(String::new());
        odd.action = Action::from("Accumulate".to_string());

        let body = content_body(&[sell, odd]);
        assert_eq!(
            body,
            "📉 Tesla [US] [Sell]\n    └ Analyst: 수요 둔화\n\n📌 에코프로 [Accumulate]\n    └ 김동환: 실적 개선"
        );
    }

    #[test]
    fn summary_mentions_time_channels_and_status() {
        let specs = plan(&OrderedMap::new(), &run_info());
        let body = &specs[0].body_text;
        assert!(body.contains("2026-10-18 09:30 KST"));
        assert!(body.contains("삼프로TV, 언더스탠딩"));
        assert!(body.contains("7 recommendations from 2 videos"));
        assert_eq!(specs[0].style.title_font_pt, 36.0);
        assert_eq!(specs[1].style.body_font_pt, 10.0);
    }

    #[test]
    fn style_tokens_are_dark_with_accent_titles() {
        assert_eq!(BACKGROUND, Rgb { r: 0x1E, g: 0x1E, b: 0x2E });
        assert_eq!(ACCENT.unit()[0], 249.0 / 255.0);
    }
}

use anyhow::Context;
use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, Utc};

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Default look-back for video discovery.
pub const DEFAULT_SEARCH_WINDOW_HOURS: i64 = 24;

pub fn offset() -> anyhow::Result<FixedOffset> {
    FixedOffset::east_opt(KST_OFFSET_SECS).context("invalid KST offset")
}

pub fn now_kst(now_utc: DateTime<Utc>) -> anyhow::Result<DateTime<FixedOffset>> {
    Ok(now_utc.with_timezone(&offset()?))
}

/// RFC 3339 `publishedAfter` bound for a search window ending at `now_utc`.
pub fn published_after(now_utc: DateTime<Utc>, window_hours: i64) -> String {
    (now_utc - Duration::hours(window_hours)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `YYYY-MM-DD HH:MM KST`, as shown on summary slides and in emails.
pub fn format_display(t: DateTime<FixedOffset>) -> String {
    format!("{} KST", t.format("%Y-%m-%d %H:%M"))
}

pub fn window_hours_from_env() -> i64 {
    std::env::var("SEARCH_WINDOW_HOURS")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|h| *h > 0)
        .unwrap_or(DEFAULT_SEARCH_WINDOW_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn converts_to_kst() {
        // 2026-10-18 00:30 UTC = 09:30 KST
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 30, 0).unwrap();
        let kst = now_kst(now).unwrap();
        assert_eq!(format_display(kst), "2026-10-18 09:30 KST");
    }

    #[test]
    fn kst_date_rolls_over_before_utc() {
        // 2026-10-17 16:00 UTC = 2026-10-18 01:00 KST
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 16, 0, 0).unwrap();
        assert_eq!(now_kst(now).unwrap().format("%Y-%m-%d").to_string(), "2026-10-18");
    }

    #[test]
    fn published_after_is_zulu_rfc3339() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 30, 0).unwrap();
        assert_eq!(published_after(now, 24), "2026-10-17T00:30:00Z");
    }
}

use crate::slides::layout::SUMMARY_PREFIX;

/// Number of daily summaries kept in the deck.
pub const DEFAULT_MAX_SUMMARIES: usize = 30;

/// Object ids to delete so that at most `max_summaries` runs remain.
///
/// `deck_slides` is the deck's current top-to-bottom order. Once there are
/// more than `max_summaries` summary markers, everything from the
/// `(max_summaries + 1)`-th marker to the end of the deck goes, including the
/// content slides interleaved after it.
pub fn trim<S: AsRef<str>>(deck_slides: &[S], max_summaries: usize) -> Vec<String> {
    let summary_indices: Vec<usize> = deck_slides
        .iter()
        .enumerate()
        .filter(|(_, id)| id.as_ref().starts_with(SUMMARY_PREFIX))
        .map(|(idx, _)| idx)
        .collect();

    if summary_indices.len() <= max_summaries {
        return Vec::new();
    }

    let cutoff = summary_indices[max_summaries];
    deck_slides[cutoff..]
        .iter()
        .map(|id| id.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `days` runs, each a summary followed by `per_day` content slides.
    fn deck(days: usize, per_day: usize) -> Vec<String> {
        let mut out = Vec::new();
        for d in 0..days {
            out.push(format!("summary_{d:03}"));
            for c in 0..per_day {
                out.push(format!("content_{d:03}_{c}"));
            }
        }
        out
    }

    #[test]
    fn at_or_below_limit_is_noop() {
        assert!(trim(&deck(30, 2), 30).is_empty());
        assert!(trim(&deck(3, 1), 30).is_empty());
        assert!(trim::<String>(&[], 30).is_empty());
    }

    #[test]
    fn deletes_from_first_excess_summary_to_end() {
        // 35 summaries among 100 slides: 30 days x 2 content + 5 days x 1 content.
        let mut slides = deck(30, 2);
        for d in 30..35 {
            slides.push(format!("summary_{d:03}"));
            slides.push(format!("content_{d:03}_0"));
        }
        assert_eq!(slides.len(), 100);

        let deleted = trim(&slides, 30);
        let cutoff = slides.iter().position(|s| s == "summary_030").unwrap();
        assert_eq!(cutoff, 90);
        assert_eq!(deleted, slides[cutoff..].to_vec());
        assert_eq!(deleted.len(), 10);
        assert!(deleted.iter().all(|id| !id.starts_with("summary_02")));
    }

    #[test]
    fn ignores_non_summary_prefixes() {
        let slides = vec!["p", "nodata_1", "summary_a", "content_1", "summary_b", "x"];
        assert_eq!(trim(&slides, 1), vec!["summary_b", "x"]);
    }
}

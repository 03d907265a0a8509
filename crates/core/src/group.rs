use crate::domain::recommendation::Recommendation;
use crate::error::PipelineError;
use std::collections::HashMap;
use std::hash::Hash;

/// Map that iterates in first-insertion order: a `Vec` of entries plus a
/// key -> position index.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Existing value for `key`, or a new one appended at the end.
    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        let pos = match self.index.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.index.insert(key.clone(), pos);
                self.entries.push((key, make()));
                pos
            }
        };
        &mut self.entries[pos].1
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationGroup {
    pub video_title: String,
    pub items: Vec<Recommendation>,
}

/// Drops records missing `stock_name`/`market`, then buckets the rest by
/// `video_id` in order of first appearance.
pub fn group(records: &[Recommendation]) -> OrderedMap<String, RecommendationGroup> {
    let mut groups: OrderedMap<String, RecommendationGroup> = OrderedMap::new();
    let mut dropped: usize = 0;

    for rec in records {
        if let Some(field) = rec.missing_required_field() {
            let err = PipelineError::ValidationMissingField {
                video_id: rec.video_id.clone(),
                field,
            };
            tracing::debug!(error = %err, stock_name = %rec.stock_name, "dropping record");
            dropped += 1;
            continue;
        }

        groups
            .get_or_insert_with(rec.video_id.clone(), || RecommendationGroup {
                video_title: rec.video_title.clone(),
                items: Vec::new(),
            })
            .items
            .push(rec.clone());
    }

    if dropped > 0 {
        tracing::info!(dropped, kept_groups = groups.len(), "dropped incomplete recommendations");
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recommendation::{Action, Market};

    fn rec(video_id: &str, stock: &str, market: Market) -> Recommendation {
        Recommendation {
            stock_name: stock.to_string(),
            market,
            speaker: "Analyst".to_string(),
            action: Action::Buy,
            reasoning: String::new(),
            time_context: "General".to_string(),
            video_title: format!("title {video_id}"),
            video_id: video_id.to_string(),
            source_type: Default::default(),
        }
    }

    #[test]
    fn keys_follow_first_appearance() {
        let records = vec![
            rec("zeta", "A", Market::Kr),
            rec("alpha", "B", Market::Us),
            rec("zeta", "C", Market::Kr),
            rec("mid", "D", Market::Kr),
            rec("alpha", "E", Market::Us),
        ];
        let groups = group(&records);
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn items_keep_input_order() {
        let records = vec![
            rec("v1", "A", Market::Kr),
            rec("v2", "B", Market::Us),
            rec("v1", "C", Market::Kr),
            rec("v1", "D", Market::Kr),
        ];
        let groups = group(&records);
        let names: Vec<&str> = groups
            .get(&"v1".to_string())
            .unwrap()
            .items
            .iter()
            .map(|r| r.stock_name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "C", "D"]);
        assert_eq!(groups.get(&"v1".to_string()).unwrap().video_title, "title v1");
    }

    #[test]
    fn drops_records_missing_required_fields() {
        let records = vec![
            rec("v1", "", Market::Kr),
            rec("v2", "Tesla", Market::Missing),
            rec("v3", "Nvidia", Market::Us),
        ];
        let groups = group(&records);
        assert_eq!(groups.len(), 1);
        assert!(groups.get(&"v1".to_string()).is_none());
    }

    #[test]
    fn reverse_iteration_starts_at_last_inserted() {
        let mut map: OrderedMap<&str, u32> = OrderedMap::new();
        *map.get_or_insert_with("b", || 0) += 1;
        *map.get_or_insert_with("a", || 0) += 1;
        *map.get_or_insert_with("b", || 0) += 1;
        let rev: Vec<(&&str, &u32)> = map.iter().rev().collect();
        assert_eq!(rev, vec![(&"a", &1u32), (&"b", &2u32)]);
    }
}

// src/rank/merge.rs
//! Score merge and top-N selection. Pure, synchronous, deterministic.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::collect::types::ScrapedItem;

use super::RankResult;

/// Overwrite item scores from `results`. Items absent from `results` keep
/// their prior score; result ids that match no item are ignored. Duplicate
/// ids resolve last-write-wins.
pub fn merge_scores(items: &mut [ScrapedItem], results: &[RankResult]) {
    if results.is_empty() {
        return;
    }
    let mut by_id: HashMap<&str, f64> = HashMap::with_capacity(results.len());
    for r in results {
        by_id.insert(r.id.as_str(), r.score);
    }
    for item in items.iter_mut() {
        if let Some(score) = by_id.get(item.id.as_str()) {
            item.score = *score;
        }
    }
}

/// Stable descending sort by score; equal scores keep their relative order.
pub fn sort_by_score(items: &mut [ScrapedItem]) {
    items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// The `n` highest-scoring items in stable descending order.
pub fn select_top(mut items: Vec<ScrapedItem>, n: usize) -> Vec<ScrapedItem> {
    sort_by_score(&mut items);
    items.truncate(n);
    items
}

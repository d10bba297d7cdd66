//! Stage 5: canonical-key deduplication
//!
//! Elements whose names normalize to the same key are merged: the higher
//! confidence element survives as the base record, and the flagged gap
//! lists of both are unioned so no gap information is ever dropped.
//! Note the key is aggressive by design - names differing only in case or
//! punctuation collapse to one row.

use crate::models::ScoredElement;
use std::collections::HashMap;

/// Normalized dedup key: lowercase, non-alphanumerics as `_`
pub fn normalize_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Merge scored elements by normalized name, preserving first-seen order
pub fn dedupe_elements(elements: Vec<ScoredElement>) -> Vec<ScoredElement> {
    let mut order: Vec<ScoredElement> = Vec::with_capacity(elements.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for el in elements {
        let key = normalize_key(&el.element.data_element_name);

        match index_by_key.get(&key) {
            Some(&idx) => {
                let existing = &mut order[idx];
                if el.element.confidence_score > existing.element.confidence_score {
                    // Newcomer wins; carry the previous gaps along
                    let mut merged = el;
                    for gap in existing.element.gaps_flagged.drain(..) {
                        if !merged.element.gaps_flagged.contains(&gap) {
                            merged.element.gaps_flagged.push(gap);
                        }
                    }
                    *existing = merged;
                } else {
                    for gap in el.element.gaps_flagged {
                        if !existing.element.gaps_flagged.contains(&gap) {
                            existing.element.gaps_flagged.push(gap);
                        }
                    }
                }
            }
            None => {
                index_by_key.insert(key, order.len());
                order.push(el);
            }
        }
    }

    order
}

//! Fused scoring for combined keyword + vector candidates.
//! Grounded in the same weighted-sum shape as RRF-style fusion
//! elsewhere in the ecosystem, but uses fixed explicit weights
//! rather than reciprocal-rank fusion.

use std::collections::BTreeSet;

const W_SEMANTIC: f64 = 0.5;
const W_KEYWORD: f64 = 0.3;
const W_FIELD: f64 = 0.2;

/// Every field name `matchedFields` can ever contain; used to normalize
/// the field-match boost to [0,1].
const TOTAL_MATCHABLE_FIELDS: usize = 7;

pub fn field_boost(matched_fields: &BTreeSet<String>) -> f64 {
    (matched_fields.len() as f64 / TOTAL_MATCHABLE_FIELDS as f64).clamp(0.0, 1.0)
}

/// `relevance = w_s*semantic + w_k*keyword + w_f*fieldBoost`, each input
/// already normalized to [0,1].
pub fn fuse(semantic_score: f64, keyword_score: f64, matched_fields: &BTreeSet<String>) -> f64 {
    let semantic = semantic_score.clamp(0.0, 1.0);
    let keyword = keyword_score.clamp(0.0, 1.0);
    let boost = field_boost(matched_fields);
    (W_SEMANTIC * semantic + W_KEYWORD * keyword + W_FIELD * boost).clamp(0.0, 1.0)
}

/// Stable ordering for identical inputs: relevance desc, then field-match
/// count desc (stricter matches first), then id asc for determinism.
/// `MemberRecord` carries no update timestamp, so a "more recent data"
/// tiebreak has no source
/// to read from and is not implemented.
pub fn compare_for_ranking(
    a: (f64, usize, i64),
    b: (f64, usize, i64),
) -> std::cmp::Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| b.1.cmp(&a.1))
        .then_with(|| a.2.cmp(&b.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuse_weights_semantic_highest() {
        let fields: BTreeSet<String> = BTreeSet::new();
        let mostly_semantic = fuse(1.0, 0.0, &fields);
        let mostly_keyword = fuse(0.0, 1.0, &fields);
        assert!(mostly_semantic > mostly_keyword);
    }

    #[test]
    fn field_boost_is_normalized() {
        let mut fields = BTreeSet::new();
        for f in ["year", "branch", "city", "services", "skills", "name", "organization"] {
            fields.insert(f.to_string());
        }
        assert_eq!(field_boost(&fields), 1.0);
    }

    #[test]
    fn ranking_breaks_ties_by_field_count_then_id() {
        let mut items = vec![(0.8, 2, 5i64), (0.8, 3, 2i64), (0.8, 2, 1i64)];
        items.sort_by(|a, b| compare_for_ranking(*a, *b));
        assert_eq!(items, vec![(0.8, 3, 2), (0.8, 2, 1), (0.8, 2, 5)]);
    }
}

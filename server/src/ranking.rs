//! Pure leaderboard computations over a store snapshot.

use crate::store::ScoreEntry;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub submitter: String,
    pub score: i64,
}

/// Sums every entry per submitter, keyed in first-seen order. Totals
/// saturate at `i64::MAX`.
pub fn aggregate(snapshot: &[ScoreEntry]) -> IndexMap<String, i64> {
    let mut totals: IndexMap<String, i64> = IndexMap::new();
    for entry in snapshot {
        let total = totals.entry(entry.submitter.clone()).or_insert(0);
        *total = total.saturating_add(entry.score);
    }
    totals
}

/// Highest total first. Equal totals keep their aggregation order; that order
/// is an artifact of insertion history, not a contract.
pub fn ranked_list(totals: IndexMap<String, i64>) -> Vec<Standing> {
    let mut pairs: Vec<(String, i64)> = totals.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs
        .into_iter()
        .enumerate()
        .map(|(i, (submitter, score))| Standing {
            rank: i + 1,
            submitter,
            score,
        })
        .collect()
}

/// 1-based position, or `None` when the submitter is not ranked.
pub fn rank_of(submitter: &str, ranked: &[Standing]) -> Option<usize> {
    ranked
        .iter()
        .position(|s| s.submitter == submitter)
        .map(|i| i + 1)
}

pub fn top_n(mut ranked: Vec<Standing>, n: usize) -> Vec<Standing> {
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn entry(category: Category, submitter: &str, score: i64) -> ScoreEntry {
        ScoreEntry {
            category,
            course: "Hakone".into(),
            variant: "Club Circuit".into(),
            submitter: submitter.into(),
            score,
        }
    }

    #[test]
    fn test_aggregate_sums_per_submitter() {
        let totals = aggregate(&[
            entry(Category::Rwd, "bob", 10),
            entry(Category::Awd, "alice", 5),
            entry(Category::Fwd, "bob", 7),
        ]);
        assert_eq!(totals.get("bob"), Some(&17));
        assert_eq!(totals.get("alice"), Some(&5));
        assert_eq!(totals.get_index(0).map(|(k, _)| k.as_str()), Some("bob"));
    }

    #[test]
    fn test_aggregate_saturates_huge_scores() {
        let totals = aggregate(&[
            entry(Category::Rwd, "bob", i64::MAX),
            entry(Category::Awd, "bob", i64::MAX),
            entry(Category::Fwd, "alice", 1),
        ]);
        assert_eq!(totals.get("bob"), Some(&i64::MAX));
        let ranked = ranked_list(totals);
        assert_eq!(ranked[0].submitter, "bob");
        assert_eq!(ranked[1].score, 1);
    }

    #[test]
    fn test_ranked_list_descending() {
        let ranked = ranked_list(aggregate(&[
            entry(Category::Rwd, "bob", 10),
            entry(Category::Rwd, "alice", 30),
            entry(Category::Rwd, "carol", 20),
        ]));
        let order: Vec<_> = ranked.iter().map(|s| s.submitter.as_str()).collect();
        assert_eq!(order, vec!["alice", "carol", "bob"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_rank_of_and_top_n() {
        let ranked = ranked_list(aggregate(&[
            entry(Category::Rwd, "bob", 10),
            entry(Category::Rwd, "alice", 30),
        ]));
        assert_eq!(rank_of("bob", &ranked), Some(2));
        assert_eq!(rank_of("nobody", &ranked), None);
        let top = top_n(ranked, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].submitter, "alice");
        assert!(top_n(Vec::new(), 10).is_empty());
    }
}

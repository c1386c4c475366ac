//! The score table: `category -> course -> variant -> submitter -> best`.
//!
//! Only personal bests are kept. Every mutation runs under the write half of
//! one store-wide lock; readers take copies through [`ScoreStore::snapshot`]
//! so ranking never holds the lock.

use crate::catalog::{Catalog, Category};
use crate::validation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Submitter -> best score, in first-submission order.
pub type VariantScores = IndexMap<String, i64>;
/// Course -> variant -> scores.
pub type CategoryBoard = IndexMap<String, IndexMap<String, VariantScores>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScoreKey {
    pub category: Category,
    pub course: String,
    pub variant: String,
    pub submitter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEntry {
    pub category: Category,
    pub course: String,
    pub variant: String,
    pub submitter: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Variant {
        category: Category,
        course: String,
        variant: String,
    },
    Category(Category),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Accepted { previous: Option<i64> },
    RejectedNotBetter { current: i64 },
    RejectedInvalidScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Whole-table contents, also the shape of the JSON record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    categories: IndexMap<Category, CategoryBoard>,
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl Board {
    /// One empty table per category.
    pub fn empty() -> Self {
        Board {
            categories: Category::all()
                .map(|c| (c, CategoryBoard::new()))
                .collect(),
        }
    }

    /// Builds a board from loose entries, keeping the ones the catalog and
    /// the submission rules accept. Submitter names are trimmed, so entries
    /// that differ only by surrounding whitespace merge into their best.
    /// Returns the board and how many entries were dropped.
    pub fn from_entries(
        catalog: &Catalog,
        entries: impl IntoIterator<Item = ScoreEntry>,
    ) -> (Self, usize) {
        let mut board = Board::empty();
        let mut dropped = 0;
        for e in entries {
            let submitter = match validation::validate_submitter(&e.submitter) {
                Ok(name) if validation::validate_score(e.score).is_ok()
                    && catalog.is_valid_variant(&e.course, &e.variant) =>
                {
                    name
                }
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            let slot = board
                .category_mut(e.category)
                .entry(e.course)
                .or_default()
                .entry(e.variant)
                .or_default()
                .entry(submitter)
                .or_insert(e.score);
            *slot = (*slot).max(e.score);
        }
        (board, dropped)
    }

    /// Re-validates a deserialized board against the catalog and restores
    /// category order.
    pub fn sanitized(self, catalog: &Catalog) -> (Self, usize) {
        Board::from_entries(catalog, self.entries().collect::<Vec<_>>())
    }

    fn category_mut(&mut self, category: Category) -> &mut CategoryBoard {
        self.categories.entry(category).or_default()
    }

    pub fn category(&self, category: Category) -> Option<&CategoryBoard> {
        self.categories.get(&category)
    }

    pub fn get(&self, key: &ScoreKey) -> Option<i64> {
        self.categories
            .get(&key.category)?
            .get(&key.course)?
            .get(&key.variant)?
            .get(&key.submitter)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry, in category then insertion order.
    pub fn entries(&self) -> impl Iterator<Item = ScoreEntry> + '_ {
        self.categories
            .iter()
            .flat_map(|(category, courses)| entries_of(*category, courses))
    }
}

fn entries_of(
    category: Category,
    courses: &CategoryBoard,
) -> impl Iterator<Item = ScoreEntry> + '_ {
    courses.iter().flat_map(move |(course, variants)| {
        variants.iter().flat_map(move |(variant, scores)| {
            scores.iter().map(move |(submitter, score)| ScoreEntry {
                category,
                course: course.clone(),
                variant: variant.clone(),
                submitter: submitter.clone(),
                score: *score,
            })
        })
    })
}

pub struct ScoreStore {
    catalog: Arc<Catalog>,
    board: RwLock<Board>,
}

impl ScoreStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_board(catalog, Board::empty())
    }

    pub fn with_board(catalog: Arc<Catalog>, board: Board) -> Self {
        ScoreStore {
            catalog,
            board: RwLock::new(board),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Board> {
        self.board.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Board> {
        self.board.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `score` only if it beats the submitter's current best for the
    /// exact tuple, or there is none yet. The submitter must already be in
    /// its trimmed form.
    pub fn upsert_if_better(&self, key: &ScoreKey, score: i64) -> UpsertOutcome {
        let canonical = validation::validate_submitter(&key.submitter)
            .is_ok_and(|name| name == key.submitter);
        if !canonical
            || validation::validate_score(score).is_err()
            || !self.catalog.is_valid_variant(&key.course, &key.variant)
        {
            return UpsertOutcome::RejectedInvalidScope;
        }

        let mut board = self.write();
        let scores = board
            .category_mut(key.category)
            .entry(key.course.clone())
            .or_default()
            .entry(key.variant.clone())
            .or_default();

        match scores.get_mut(&key.submitter) {
            Some(current) if score <= *current => {
                UpsertOutcome::RejectedNotBetter { current: *current }
            }
            Some(current) => {
                let previous = *current;
                *current = score;
                UpsertOutcome::Accepted {
                    previous: Some(previous),
                }
            }
            None => {
                scores.insert(key.submitter.clone(), score);
                UpsertOutcome::Accepted { previous: None }
            }
        }
    }

    pub fn delete(&self, key: &ScoreKey) -> DeleteOutcome {
        let mut board = self.write();
        let Some(courses) = board.categories.get_mut(&key.category) else {
            return DeleteOutcome::NotFound;
        };
        let Some(variants) = courses.get_mut(&key.course) else {
            return DeleteOutcome::NotFound;
        };
        let Some(scores) = variants.get_mut(&key.variant) else {
            return DeleteOutcome::NotFound;
        };
        if scores.shift_remove(&key.submitter).is_none() {
            return DeleteOutcome::NotFound;
        }

        // Drop emptied branches so the record does not accumulate stubs.
        if scores.is_empty() {
            variants.shift_remove(&key.variant);
        }
        if variants.is_empty() {
            courses.shift_remove(&key.course);
        }
        DeleteOutcome::Deleted
    }

    /// Removes every entry in `category`, returning how many there were.
    pub fn clear_category(&self, category: Category) -> usize {
        let mut board = self.write();
        let courses = board.category_mut(category);
        let removed = entries_of(category, courses).count();
        courses.clear();
        removed
    }

    pub fn clear_all(&self) -> usize {
        let mut board = self.write();
        let removed = board.len();
        *board = Board::empty();
        removed
    }

    pub fn get(&self, key: &ScoreKey) -> Option<i64> {
        self.read().get(key)
    }

    /// Point-in-time copy of every entry under `scope`.
    pub fn snapshot(&self, scope: &Scope) -> Vec<ScoreEntry> {
        let board = self.read();
        match scope {
            Scope::All => board.entries().collect(),
            Scope::Category(category) => board
                .category(*category)
                .map(|courses| entries_of(*category, courses).collect())
                .unwrap_or_default(),
            Scope::Variant {
                category,
                course,
                variant,
            } => board
                .category(*category)
                .and_then(|courses| courses.get(course))
                .and_then(|variants| variants.get(variant))
                .map(|scores| {
                    scores
                        .iter()
                        .map(|(submitter, score)| ScoreEntry {
                            category: *category,
                            course: course.clone(),
                            variant: variant.clone(),
                            submitter: submitter.clone(),
                            score: *score,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Copy of the whole table for serialization.
    pub fn contents(&self) -> Board {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ScoreStore {
        ScoreStore::new(Arc::new(Catalog::builtin()))
    }

    fn key(category: Category, submitter: &str) -> ScoreKey {
        ScoreKey {
            category,
            course: "Brands Hatch".into(),
            variant: "Indy Circuit".into(),
            submitter: submitter.into(),
        }
    }

    #[test]
    fn test_only_strict_improvements_are_stored() {
        let store = store();
        let bob = key(Category::Rwd, "bob");
        assert_eq!(
            store.upsert_if_better(&bob, 100),
            UpsertOutcome::Accepted { previous: None }
        );
        assert_eq!(
            store.upsert_if_better(&bob, 100),
            UpsertOutcome::RejectedNotBetter { current: 100 }
        );
        assert_eq!(
            store.upsert_if_better(&bob, 90),
            UpsertOutcome::RejectedNotBetter { current: 100 }
        );
        assert_eq!(
            store.upsert_if_better(&bob, 150),
            UpsertOutcome::Accepted {
                previous: Some(100)
            }
        );
        assert_eq!(store.get(&bob), Some(150));
    }

    #[test]
    fn test_invalid_scope_rejected() {
        let store = store();
        let mut bad = key(Category::Rwd, "bob");
        assert_eq!(
            store.upsert_if_better(&bad, 0),
            UpsertOutcome::RejectedInvalidScope
        );
        assert_eq!(
            store.upsert_if_better(&bad, i64::MAX),
            UpsertOutcome::RejectedInvalidScope
        );
        let long = "x".repeat(70);
        for name in [" bob", "", long.as_str()] {
            assert_eq!(
                store.upsert_if_better(&key(Category::Rwd, name), 10),
                UpsertOutcome::RejectedInvalidScope
            );
        }
        bad.variant = "Full Circuit".into();
        assert_eq!(
            store.upsert_if_better(&bad, 10),
            UpsertOutcome::RejectedInvalidScope
        );
        assert!(store.contents().is_empty());
    }

    #[test]
    fn test_delete_and_prune() {
        let store = store();
        let bob = key(Category::Rwd, "bob");
        store.upsert_if_better(&bob, 10);
        assert_eq!(store.delete(&key(Category::Rwd, "alice")), DeleteOutcome::NotFound);
        assert_eq!(store.delete(&key(Category::Awd, "bob")), DeleteOutcome::NotFound);
        assert_eq!(store.delete(&bob), DeleteOutcome::Deleted);
        assert_eq!(store.delete(&bob), DeleteOutcome::NotFound);
        assert_eq!(store.contents(), Board::empty());
    }

    #[test]
    fn test_clear_category_leaves_others() {
        let store = store();
        store.upsert_if_better(&key(Category::Rwd, "bob"), 10);
        store.upsert_if_better(&key(Category::Awd, "bob"), 20);
        assert_eq!(store.clear_category(Category::Rwd), 1);
        assert_eq!(store.clear_category(Category::Rwd), 0);
        assert_eq!(store.snapshot(&Scope::Category(Category::Rwd)), vec![]);
        assert_eq!(store.snapshot(&Scope::All).len(), 1);
        assert_eq!(store.clear_all(), 1);
        assert_eq!(store.contents(), Board::empty());
    }

    #[test]
    fn test_snapshot_scopes() {
        let store = store();
        store.upsert_if_better(&key(Category::Rwd, "bob"), 10);
        store.upsert_if_better(&key(Category::Rwd, "alice"), 30);
        let other = ScoreKey {
            course: "Hakone".into(),
            variant: "Club Circuit".into(),
            ..key(Category::Rwd, "bob")
        };
        store.upsert_if_better(&other, 5);
        store.upsert_if_better(&key(Category::Fwd, "carol"), 7);

        let scope = Scope::Variant {
            category: Category::Rwd,
            course: "Brands Hatch".into(),
            variant: "Indy Circuit".into(),
        };
        let submitters: Vec<_> = store
            .snapshot(&scope)
            .into_iter()
            .map(|e| e.submitter)
            .collect();
        assert_eq!(submitters, vec!["bob", "alice"]);
        assert_eq!(store.snapshot(&Scope::Category(Category::Rwd)).len(), 3);
        assert_eq!(store.snapshot(&Scope::All).len(), 4);
        assert!(store
            .snapshot(&Scope::Variant {
                category: Category::Awd,
                course: "Nowhere".into(),
                variant: "x".into(),
            })
            .is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_from_later_writes() {
        let store = store();
        store.upsert_if_better(&key(Category::Rwd, "bob"), 10);
        let before = store.snapshot(&Scope::All);
        store.upsert_if_better(&key(Category::Rwd, "bob"), 20);
        assert_eq!(before[0].score, 10);
    }

    #[test]
    fn test_board_serializes_every_category() {
        let json = serde_json::to_value(Board::empty()).unwrap();
        assert_eq!(json, serde_json::json!({ "RWD": {}, "AWD": {}, "FWD": {} }));
    }

    #[test]
    fn test_sanitized_drops_unknown_entries() {
        let catalog = Catalog::builtin();
        let board: Board = serde_json::from_value(serde_json::json!({
            "FWD": {
                "Hakone": { "Club Circuit": { "bob": 12, "eve": -3 } },
                "Atlantis": { "Main": { "bob": 99 } }
            }
        }))
        .unwrap();
        let (board, dropped) = board.sanitized(&catalog);
        assert_eq!(dropped, 2);
        assert_eq!(board.len(), 1);
        assert_eq!(
            board.category(Category::Rwd).map(|c| c.len()),
            Some(0)
        );
    }

    #[test]
    fn test_sanitized_normalizes_submitter_names() {
        let catalog = Catalog::builtin();
        let long = "x".repeat(70);
        let board: Board = serde_json::from_value(serde_json::json!({
            "RWD": {
                "Hakone": { "Club Circuit": { " bob": 10, long.as_str(): 5, "bob ": 7 } }
            }
        }))
        .unwrap();
        let (board, dropped) = board.sanitized(&catalog);
        assert_eq!(dropped, 1);
        assert_eq!(board.len(), 1);

        let store = ScoreStore::with_board(Arc::new(catalog), board);
        let bob = ScoreKey {
            category: Category::Rwd,
            course: "Hakone".into(),
            variant: "Club Circuit".into(),
            submitter: "bob".into(),
        };
        assert_eq!(store.get(&bob), Some(10));
        assert_eq!(store.delete(&bob), DeleteOutcome::Deleted);
        assert!(store.contents().is_empty());
    }

    #[test]
    fn test_concurrent_upserts_keep_maximum() {
        let store = store();
        let bob = key(Category::Rwd, "bob");
        std::thread::scope(|s| {
            for t in 0..8 {
                let store = &store;
                let bob = &bob;
                s.spawn(move || {
                    for i in 1..=100 {
                        store.upsert_if_better(bob, i * 8 + t);
                    }
                });
            }
        });
        assert_eq!(store.get(&bob), Some(807));
    }
}

use crate::catalog::{Catalog, Category};
use crate::error::InvalidInput;
use crate::models::leaderboard::*;
use crate::persistence::Persistence;
use crate::ranking::{self, Standing};
use crate::rate_limit::RateLimiter;
use crate::store::{DeleteOutcome, ScoreEntry, ScoreStore, Scope, UpsertOutcome};
use crate::validation;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub cooldown: Duration,
    pub top_n: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cooldown: Duration::seconds(30),
            top_n: 10,
        }
    }
}

/// The scoreboard service: validation, cooldowns, personal-best storage,
/// rankings and persistence behind one explicitly constructed value.
pub struct Leaderboard {
    catalog: Arc<Catalog>,
    store: ScoreStore,
    limiter: RateLimiter,
    persistence: Persistence,
    settings: Settings,
    /// Held across cooldown check, upsert and record so two racing
    /// submissions from one submitter cannot both pass the check.
    submit_gate: Mutex<()>,
}

impl Leaderboard {
    /// Loads (or creates) the durable record and builds the service on it.
    pub fn open(
        catalog: Arc<Catalog>,
        persistence: Persistence,
        settings: Settings,
    ) -> Self {
        let board = persistence.restore(&catalog);
        Leaderboard {
            store: ScoreStore::with_board(catalog.clone(), board),
            catalog,
            limiter: RateLimiter::new(),
            persistence,
            settings,
            submit_gate: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    fn flush(&self) -> Option<String> {
        match self.persistence.flush(&self.store) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "leaderboard flush failed; in-memory state kept");
                Some(e.to_string())
            }
        }
    }

    pub fn submit(&self, req: &ScoreSubmission) -> Mutation<SubmitResult> {
        self.submit_at(req, Utc::now())
    }

    pub fn submit_at(&self, req: &ScoreSubmission, now: DateTime<Utc>) -> Mutation<SubmitResult> {
        let result = self.try_submit(req, now);
        match &result {
            SubmitResult::Accepted { new_best, .. } => tracing::info!(
                submitter = %req.submitter.trim(),
                category = %req.category,
                course = %req.course,
                variant = %req.variant,
                score = *new_best,
                "score accepted"
            ),
            rejected => {
                tracing::debug!(submitter = %req.submitter.trim(), outcome = ?rejected, "score rejected")
            }
        }

        if matches!(result, SubmitResult::Accepted { .. }) {
            Mutation {
                outcome: result,
                flush_warning: self.flush(),
            }
        } else {
            Mutation::unflushed(result)
        }
    }

    fn try_submit(&self, req: &ScoreSubmission, now: DateTime<Utc>) -> SubmitResult {
        let submitter = match validation::validate_submitter(&req.submitter) {
            Ok(s) => s,
            Err(e) => return invalid(e),
        };

        let _gate = self.submit_gate.lock().unwrap_or_else(PoisonError::into_inner);

        if let Err(remaining) = self
            .limiter
            .try_accept(&submitter, self.settings.cooldown, now)
        {
            return SubmitResult::RejectedCooldown {
                retry_after_secs: ((remaining.num_milliseconds() + 999) / 1000).max(1),
            };
        }

        let key = match validation::score_key(
            &self.catalog,
            &req.category,
            &req.course,
            &req.variant,
            &submitter,
        ) {
            Ok(key) => key,
            Err(e) => return invalid(e),
        };
        if let Err(e) = validation::validate_score(req.score) {
            return invalid(e);
        }

        match self.store.upsert_if_better(&key, req.score) {
            UpsertOutcome::Accepted { previous } => {
                self.limiter.record_accepted(&key.submitter, now);
                SubmitResult::Accepted {
                    new_best: req.score,
                    previous_best: previous,
                }
            }
            UpsertOutcome::RejectedNotBetter { current } => SubmitResult::RejectedNotBetter {
                current_best: current,
            },
            UpsertOutcome::RejectedInvalidScope => SubmitResult::RejectedInvalidInput {
                reason: "score does not fit a known category, course and variant".into(),
            },
        }
    }

    fn ranked(&self, scope: &Scope) -> Vec<Standing> {
        ranking::ranked_list(ranking::aggregate(&self.store.snapshot(scope)))
    }

    pub fn query_scope(
        &self,
        category: &str,
        course: &str,
        variant: &str,
    ) -> Result<LeaderboardView, InvalidInput> {
        let category = validation::validate_category(category)?;
        validation::validate_course_variant(&self.catalog, course, variant)?;
        let scope = Scope::Variant {
            category,
            course: course.to_string(),
            variant: variant.to_string(),
        };
        Ok(LeaderboardView {
            title: format!("{} | {} | {}", category, course, variant),
            entries: ranking::top_n(self.ranked(&scope), self.settings.top_n),
        })
    }

    pub fn query_category_totals(&self, category: &str) -> Result<LeaderboardView, InvalidInput> {
        let category = validation::validate_category(category)?;
        Ok(LeaderboardView {
            title: format!("{} Leaderboard", category),
            entries: ranking::top_n(
                self.ranked(&Scope::Category(category)),
                self.settings.top_n,
            ),
        })
    }

    pub fn query_grand_total(&self) -> LeaderboardView {
        LeaderboardView {
            title: "Overall Leaderboard".into(),
            entries: ranking::top_n(self.ranked(&Scope::All), self.settings.top_n),
        }
    }

    /// `None` when the submitter has no scores anywhere. Every figure comes
    /// from one snapshot, so category totals always sum to the grand total.
    pub fn query_submitter_stats(
        &self,
        submitter: &str,
    ) -> Result<Option<SubmitterStats>, InvalidInput> {
        let submitter = validation::validate_submitter(submitter)?;
        let snapshot = self.store.snapshot(&Scope::All);

        let overall = ranking::ranked_list(ranking::aggregate(&snapshot));
        let Some(rank) = ranking::rank_of(&submitter, &overall) else {
            return Ok(None);
        };
        let grand_total = overall[rank - 1].score;

        let per_category = Category::all()
            .filter_map(|category| {
                let entries: Vec<ScoreEntry> = snapshot
                    .iter()
                    .filter(|e| e.category == category)
                    .cloned()
                    .collect();
                let ranked = ranking::ranked_list(ranking::aggregate(&entries));
                let rank = ranking::rank_of(&submitter, &ranked)?;
                Some(CategoryStanding {
                    category,
                    total: ranked[rank - 1].score,
                    rank,
                })
            })
            .collect();

        Ok(Some(SubmitterStats {
            submitter,
            grand_total,
            rank,
            per_category,
        }))
    }

    /// Privileged: the caller must already have checked authorization.
    pub fn admin_delete(
        &self,
        category: &str,
        course: &str,
        variant: &str,
        submitter: &str,
    ) -> Result<Mutation<DeleteOutcome>, InvalidInput> {
        let key = validation::score_key(&self.catalog, category, course, variant, submitter)?;
        let outcome = self.store.delete(&key);
        tracing::info!(?key, ?outcome, "admin delete");
        Ok(match outcome {
            DeleteOutcome::Deleted => Mutation {
                outcome,
                flush_warning: self.flush(),
            },
            DeleteOutcome::NotFound => Mutation::unflushed(outcome),
        })
    }

    /// Privileged: the caller must already have checked authorization.
    pub fn admin_clear_category(&self, category: &str) -> Result<Mutation<Cleared>, InvalidInput> {
        let category = validation::validate_category(category)?;
        let removed = self.store.clear_category(category);
        tracing::info!(%category, removed, "admin cleared category");
        Ok(Mutation {
            outcome: Cleared { removed },
            flush_warning: self.flush(),
        })
    }

    /// Privileged: the caller must already have checked authorization.
    pub fn admin_clear_all(&self) -> Mutation<Cleared> {
        let removed = self.store.clear_all();
        tracing::info!(removed, "admin cleared all scores");
        Mutation {
            outcome: Cleared { removed },
            flush_warning: self.flush(),
        }
    }
}

fn invalid(e: InvalidInput) -> SubmitResult {
    SubmitResult::RejectedInvalidInput {
        reason: e.to_string(),
    }
}

use crate::catalog::Category;
use crate::ranking::Standing;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub submitter: String,
    pub category: String,
    pub course: String,
    pub variant: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResult {
    Accepted {
        new_best: i64,
        previous_best: Option<i64>,
    },
    RejectedCooldown {
        retry_after_secs: i64,
    },
    RejectedInvalidInput {
        reason: String,
    },
    RejectedNotBetter {
        current_best: i64,
    },
}

/// Outcome of a state-changing call. `flush_warning` is set when the change
/// was applied in memory but could not be written to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mutation<T> {
    pub outcome: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_warning: Option<String>,
}

impl<T> Mutation<T> {
    pub fn unflushed(outcome: T) -> Self {
        Mutation {
            outcome,
            flush_warning: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cleared {
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardView {
    pub title: String,
    pub entries: Vec<Standing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStanding {
    pub category: Category,
    pub total: i64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitterStats {
    pub submitter: String,
    pub grand_total: i64,
    pub rank: usize,
    pub per_category: Vec<CategoryStanding>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteScoreRequest {
    pub category: String,
    pub course: String,
    pub variant: String,
    pub submitter: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub kind: String,
    pub q: Option<String>,
    pub course: Option<String>,
}

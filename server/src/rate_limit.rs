//! Per-submitter submission cooldown.
//!
//! Checking and recording are split: a submission only consumes the
//! cooldown once the store has actually accepted it.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct RateLimiter {
    /// Submitter -> time of last accepted submission
    last_accepted: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(())` when the submitter may submit at `now`, otherwise the time
    /// left on their cooldown. Does not record anything.
    pub fn try_accept(
        &self,
        submitter: &str,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), Duration> {
        let state = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match state.get(submitter) {
            Some(last) => {
                let elapsed = now - *last;
                if elapsed < cooldown {
                    Err(cooldown - elapsed)
                } else {
                    Ok(())
                }
            }
            None => Ok(()),
        }
    }

    /// Call only after the store accepted the submission.
    pub fn record_accepted(&self, submitter: &str, now: DateTime<Utc>) {
        let mut state = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.insert(submitter.to_string(), now);
    }

    pub fn tracked(&self) -> usize {
        self.last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

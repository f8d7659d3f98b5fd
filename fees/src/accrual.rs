//! Debt accrual engine.
//!
//! A position's debt is materialised at checkpoints. Between checkpoints the
//! live debt is `accrued_debt + schedule.accrued_since(last_checkpoint_at, now)`,
//! and a position without a tier accrues nothing.

use crate::error::FeeError;
use crate::schedule::FeeSchedule;
use accesskey_types::Timestamp;
use serde::{Deserialize, Serialize};

/// Fee accrued under `schedule` over `[since, now)`; zero without a schedule.
pub fn accrued_since(
    schedule: Option<&FeeSchedule>,
    since: Timestamp,
    now: Timestamp,
) -> Result<u128, FeeError> {
    match schedule {
        Some(schedule) => schedule.accrued_since(since, now),
        None if now < since => Err(FeeError::InvalidTimeOrder {
            earlier: since,
            later: now,
        }),
        None => Ok(0),
    }
}

/// Materialised debt of one position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtCheckpoint {
    pub accrued_debt: u128,
    pub last_checkpoint_at: Timestamp,
}

impl DebtCheckpoint {
    pub fn new(at: Timestamp) -> Self {
        Self {
            accrued_debt: 0,
            last_checkpoint_at: at,
        }
    }

    /// Live debt at `now` without mutating the checkpoint.
    pub fn debt_at(&self, schedule: Option<&FeeSchedule>, now: Timestamp) -> Result<u128, FeeError> {
        let delta = accrued_since(schedule, self.last_checkpoint_at, now)?;
        self.accrued_debt.checked_add(delta).ok_or(FeeError::Overflow)
    }

    /// Fold accrual since the last checkpoint into `accrued_debt`.
    ///
    /// Returns the newly accrued amount.
    pub fn checkpoint(&mut self, schedule: Option<&FeeSchedule>, now: Timestamp) -> Result<u128, FeeError> {
        let delta = accrued_since(schedule, self.last_checkpoint_at, now)?;
        self.accrued_debt = self.accrued_debt.checked_add(delta).ok_or(FeeError::Overflow)?;
        self.last_checkpoint_at = now;
        tracing::debug!(delta, debt = self.accrued_debt, at = %now, "debt checkpoint");
        Ok(delta)
    }

    /// Take the materialised debt, leaving zero.
    pub fn clear(&mut self) -> u128 {
        std::mem::take(&mut self.accrued_debt)
    }
}

//! Append-only fee-rate history of a tier.

use crate::error::FeeError;
use accesskey_types::Timestamp;
use serde::{Deserialize, Serialize};

/// A fee rate that applies from `effective_at` until the next point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRatePoint {
    pub effective_at: Timestamp,
    /// Base-asset raw units per second.
    pub fee_per_second: u128,
}

/// Time-ordered fee rates of one tier.
///
/// Points are never rewritten: a rate change appends one point effective from
/// its own timestamp forward, so time already elapsed is always charged at
/// the rate that was in force.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    points: Vec<FeeRatePoint>,
}

impl FeeSchedule {
    pub fn new(initial_rate: u128, effective_at: Timestamp) -> Self {
        Self {
            points: vec![FeeRatePoint {
                effective_at,
                fee_per_second: initial_rate,
            }],
        }
    }

    pub fn points(&self) -> &[FeeRatePoint] {
        &self.points
    }

    /// Append a rate change. O(1).
    pub fn push_rate(&mut self, fee_per_second: u128, effective_at: Timestamp) -> Result<(), FeeError> {
        if let Some(last) = self.points.last() {
            if effective_at < last.effective_at {
                return Err(FeeError::InvalidTimeOrder {
                    earlier: last.effective_at,
                    later: effective_at,
                });
            }
        }
        self.points.push(FeeRatePoint {
            effective_at,
            fee_per_second,
        });
        Ok(())
    }

    /// The most recently appended rate.
    pub fn current_rate(&self) -> u128 {
        self.points.last().map(|p| p.fee_per_second).unwrap_or(0)
    }

    /// The rate in force at `at` (zero before the first point).
    pub fn rate_at(&self, at: Timestamp) -> u128 {
        self.points
            .iter()
            .rev()
            .find(|p| p.effective_at <= at)
            .map(|p| p.fee_per_second)
            .unwrap_or(0)
    }

    /// Fee accrued over `[since, now)`.
    ///
    /// Each point with `effective_at < now` covers the interval up to the next
    /// point (or `now` for the last one); the overlap with `[since, now)` is
    /// charged at that point's rate. O(k) in the number of rate changes.
    pub fn accrued_since(&self, since: Timestamp, now: Timestamp) -> Result<u128, FeeError> {
        if now < since {
            return Err(FeeError::InvalidTimeOrder {
                earlier: since,
                later: now,
            });
        }
        let mut total: u128 = 0;
        for (i, point) in self.points.iter().enumerate() {
            if point.effective_at >= now {
                break;
            }
            let seg_end = self
                .points
                .get(i + 1)
                .map(|next| next.effective_at.min(now))
                .unwrap_or(now);
            let seg_start = point.effective_at.max(since);
            if seg_start >= seg_end {
                continue;
            }
            let duration = seg_end.as_secs() - seg_start.as_secs();
            let accrued = point
                .fee_per_second
                .checked_mul(duration as u128)
                .ok_or(FeeError::Overflow)?;
            total = total.checked_add(accrued).ok_or(FeeError::Overflow)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn single_point_accrual() {
        let s = FeeSchedule::new(100, ts(0));
        assert_eq!(s.current_rate(), 100);
        assert_eq!(s.accrued_since(ts(0), ts(10)).unwrap(), 1000);
    }

    #[test]
    fn checkpoint_after_first_point() {
        let s = FeeSchedule::new(50, ts(0));
        assert_eq!(s.accrued_since(ts(500), ts(1000)).unwrap(), 25_000);
    }

    #[test]
    fn spans_partial_segments() {
        let mut s = FeeSchedule::new(10, ts(0));
        s.push_rate(20, ts(100)).unwrap();
        s.push_rate(30, ts(200)).unwrap();

        // 10*50 + 20*100 + 30*50
        assert_eq!(s.accrued_since(ts(50), ts(250)).unwrap(), 4000);
    }

    #[test]
    fn zero_elapsed_is_zero() {
        let s = FeeSchedule::new(100, ts(0));
        assert_eq!(s.accrued_since(ts(500), ts(500)).unwrap(), 0);
    }

    #[test]
    fn reversed_interval_is_rejected() {
        let s = FeeSchedule::new(100, ts(0));
        assert_eq!(
            s.accrued_since(ts(500), ts(400)),
            Err(FeeError::InvalidTimeOrder {
                earlier: ts(500),
                later: ts(400)
            })
        );
    }

    #[test]
    fn rate_change_is_not_retroactive() {
        let mut s = FeeSchedule::new(10, ts(0));
        s.push_rate(1_000, ts(100)).unwrap();
        assert_eq!(s.accrued_since(ts(0), ts(100)).unwrap(), 1_000);
        assert_eq!(s.accrued_since(ts(0), ts(101)).unwrap(), 2_000);
    }

    #[test]
    fn future_point_is_ignored_until_effective() {
        let mut s = FeeSchedule::new(10, ts(0));
        s.push_rate(99, ts(1_000)).unwrap();
        assert_eq!(s.accrued_since(ts(0), ts(500)).unwrap(), 5_000);
        assert_eq!(s.rate_at(ts(500)), 10);
        assert_eq!(s.rate_at(ts(1_000)), 99);
    }

    #[test]
    fn interval_before_first_point_accrues_nothing() {
        let s = FeeSchedule::new(10, ts(1_000));
        assert_eq!(s.accrued_since(ts(0), ts(1_000)).unwrap(), 0);
        assert_eq!(s.rate_at(ts(999)), 0);
    }

    #[test]
    fn reject_backwards_rate_change() {
        let mut s = FeeSchedule::new(100, ts(1000));
        assert!(s.push_rate(200, ts(500)).is_err());
        assert_eq!(s.points().len(), 1);
    }

    #[test]
    fn same_second_changes_keep_the_last() {
        let mut s = FeeSchedule::new(10, ts(0));
        s.push_rate(20, ts(100)).unwrap();
        s.push_rate(30, ts(100)).unwrap();
        // The 20 point covers a zero-length interval.
        assert_eq!(s.accrued_since(ts(0), ts(110)).unwrap(), 10 * 100 + 30 * 10);
        assert_eq!(s.rate_at(ts(100)), 30);
    }

    #[test]
    fn overflow_is_reported() {
        let s = FeeSchedule::new(u128::MAX, ts(0));
        assert_eq!(s.accrued_since(ts(0), ts(2)), Err(FeeError::Overflow));
    }
}

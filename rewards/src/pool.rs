//! The global reward stream.

use crate::accumulator::{spread, RewardAccumulator};
use crate::error::RewardError;
use accesskey_types::math::ACC_PRECISION;
use accesskey_types::{TierId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of advancing the pool to a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Emission {
    /// `reward_rate * elapsed`.
    pub due: u128,
    /// The part of `due` covered by the reserve.
    pub emitted: u128,
    /// Accumulator increase per unit of recipient weight.
    pub acc_increment: u128,
}

impl Emission {
    pub fn shortfall(&self) -> u128 {
        self.due - self.emitted
    }
}

/// Streams `reward_rate` per second to weighted recipients.
///
/// Emission is capped by `reserve`: what cannot be paid is counted in
/// `unfunded` and never owed later. While no recipient is registered nothing
/// is emitted, so an empty pool strands no rewards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPool {
    pub reward_rate: u128,
    pub last_update_at: Timestamp,
    acc_per_weight: u128,
    /// Emitted reward not yet in `acc_per_weight`, scaled by `ACC_PRECISION`.
    carry: u128,
    total_weight: u128,
    recipients: BTreeMap<TierId, u128>,
    /// Funded reward not yet emitted.
    pub reserve: u128,
    /// Reward due under the rate that the reserve could not cover.
    pub unfunded: u128,
    pub total_emitted: u128,
}

impl RewardPool {
    pub fn new(now: Timestamp) -> Self {
        Self {
            reward_rate: 0,
            last_update_at: now,
            acc_per_weight: 0,
            carry: 0,
            total_weight: 0,
            recipients: BTreeMap::new(),
            reserve: 0,
            unfunded: 0,
            total_emitted: 0,
        }
    }

    pub fn recipient_weight(&self, tier: TierId) -> Option<u128> {
        self.recipients.get(&tier).copied()
    }

    /// Registered recipients and their weights, by tier id.
    pub fn recipients(&self) -> impl Iterator<Item = (TierId, u128)> + '_ {
        self.recipients.iter().map(|(tier, weight)| (*tier, *weight))
    }

    /// What advancing to `now` would emit, without mutating.
    pub fn emission_at(&self, now: Timestamp) -> Result<Emission, RewardError> {
        let elapsed = self
            .last_update_at
            .checked_duration_until(now)
            .ok_or(RewardError::InvalidTimeOrder {
                earlier: self.last_update_at,
                later: now,
            })?;
        if self.total_weight == 0 || self.reward_rate == 0 || elapsed == 0 {
            return Ok(Emission::default());
        }
        let due = self
            .reward_rate
            .checked_mul(elapsed as u128)
            .ok_or(RewardError::Overflow)?;
        let emitted = due.min(self.reserve);
        Ok(Emission {
            due,
            emitted,
            acc_increment: spread(emitted, self.carry, self.total_weight, ACC_PRECISION)?.increment,
        })
    }

    /// Accumulator value as of `now`, without mutating.
    pub fn acc_at(&self, now: Timestamp) -> Result<u128, RewardError> {
        let emission = self.emission_at(now)?;
        self.acc_per_weight
            .checked_add(emission.acc_increment)
            .ok_or(RewardError::Overflow)
    }

    /// Advance the stream to `now`.
    pub fn update(&mut self, now: Timestamp) -> Result<Emission, RewardError> {
        let emission = self.emission_at(now)?;
        self.reserve -= emission.emitted;
        self.distribute(emission.emitted)?;
        self.total_emitted = self
            .total_emitted
            .checked_add(emission.emitted)
            .ok_or(RewardError::Overflow)?;
        let shortfall = emission.shortfall();
        if shortfall > 0 {
            self.unfunded = self.unfunded.checked_add(shortfall).ok_or(RewardError::Overflow)?;
            tracing::warn!(shortfall, unfunded = self.unfunded, "reward reserve exhausted");
        }
        self.last_update_at = now;
        Ok(emission)
    }

    /// Register a tier with a static weight. Existing recipients are paid up to `now` first.
    pub fn add_recipient(&mut self, tier: TierId, weight: u128, now: Timestamp) -> Result<(), RewardError> {
        if weight == 0 {
            return Err(RewardError::ZeroWeight);
        }
        if self.recipients.contains_key(&tier) {
            return Err(RewardError::DuplicateRecipient(tier));
        }
        let total_weight = self.total_weight.checked_add(weight).ok_or(RewardError::Overflow)?;
        self.update(now)?;
        self.recipients.insert(tier, weight);
        self.total_weight = total_weight;
        Ok(())
    }

    /// Change the emission rate from `now` forward. Zero stops the stream.
    pub fn set_rate(&mut self, reward_rate: u128, now: Timestamp) -> Result<(), RewardError> {
        self.update(now)?;
        self.reward_rate = reward_rate;
        Ok(())
    }

    /// Add to the reserve.
    pub fn fund(&mut self, amount: u128) -> Result<(), RewardError> {
        self.reserve = self.reserve.checked_add(amount).ok_or(RewardError::Overflow)?;
        Ok(())
    }

    /// Return reward a recipient could not pass on. It counts as never emitted.
    pub(crate) fn refund(&mut self, amount: u128) -> Result<(), RewardError> {
        let total_emitted = self
            .total_emitted
            .checked_sub(amount)
            .ok_or(RewardError::Overflow)?;
        self.fund(amount)?;
        self.total_emitted = total_emitted;
        Ok(())
    }
}

impl RewardAccumulator for RewardPool {
    fn total_weight(&self) -> u128 {
        self.total_weight
    }

    fn acc_per_weight(&self) -> u128 {
        self.acc_per_weight
    }

    fn distribute(&mut self, amount: u128) -> Result<u128, RewardError> {
        if self.total_weight == 0 {
            return Ok(amount);
        }
        let step = spread(amount, self.carry, self.total_weight, ACC_PRECISION)?;
        self.acc_per_weight = self
            .acc_per_weight
            .checked_add(step.increment)
            .ok_or(RewardError::Overflow)?;
        self.carry = step.carry;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn funded_pool(reserve: u128) -> RewardPool {
        let mut pool = RewardPool::new(ts(0));
        pool.fund(reserve).unwrap();
        pool.add_recipient(TierId(0), 1, ts(0)).unwrap();
        pool
    }

    #[test]
    fn nothing_accrues_without_recipients() {
        let mut pool = RewardPool::new(ts(0));
        pool.fund(1_000).unwrap();
        pool.set_rate(10, ts(0)).unwrap();
        let emission = pool.update(ts(50)).unwrap();
        assert_eq!(emission, Emission::default());
        assert_eq!(pool.reserve, 1_000);
        assert_eq!(pool.unfunded, 0);
    }

    #[test]
    fn streams_rate_times_elapsed() {
        let mut pool = funded_pool(1_000);
        pool.set_rate(10, ts(0)).unwrap();
        let emission = pool.update(ts(30)).unwrap();
        assert_eq!(emission.emitted, 300);
        assert_eq!(pool.reserve, 700);
        assert_eq!(pool.acc_per_weight(), 300 * ACC_PRECISION);
    }

    #[test]
    fn emission_is_capped_by_reserve() {
        let mut pool = funded_pool(100);
        pool.set_rate(10, ts(0)).unwrap();
        let emission = pool.update(ts(30)).unwrap();
        assert_eq!(emission.emitted, 100);
        assert_eq!(emission.shortfall(), 200);
        assert_eq!(pool.unfunded, 200);
        assert_eq!(pool.reserve, 0);
    }

    #[test]
    fn view_matches_update() {
        let mut pool = funded_pool(10_000);
        pool.set_rate(7, ts(0)).unwrap();
        let viewed = pool.acc_at(ts(123)).unwrap();
        pool.update(ts(123)).unwrap();
        assert_eq!(pool.acc_per_weight(), viewed);
    }

    #[test]
    fn rate_change_is_not_retroactive() {
        let mut pool = funded_pool(1_000_000);
        pool.set_rate(10, ts(0)).unwrap();
        pool.set_rate(100, ts(10)).unwrap();
        pool.update(ts(20)).unwrap();
        assert_eq!(pool.total_emitted, 10 * 10 + 100 * 10);
    }

    #[test]
    fn adding_recipient_settles_existing_weight_first() {
        let mut pool = funded_pool(1_000_000);
        pool.set_rate(10, ts(0)).unwrap();
        pool.add_recipient(TierId(1), 1, ts(10)).unwrap();
        let acc_at_join = pool.acc_per_weight();
        assert_eq!(acc_at_join, 100 * ACC_PRECISION);
        pool.update(ts(20)).unwrap();
        assert_eq!(pool.acc_per_weight() - acc_at_join, 50 * ACC_PRECISION);
    }

    #[test]
    fn rejects_duplicate_and_zero_weight() {
        let mut pool = funded_pool(0);
        assert_eq!(
            pool.add_recipient(TierId(0), 5, ts(1)),
            Err(RewardError::DuplicateRecipient(TierId(0)))
        );
        assert_eq!(pool.add_recipient(TierId(1), 0, ts(1)), Err(RewardError::ZeroWeight));
    }

    #[test]
    fn uneven_split_carries_the_remainder() {
        let mut pool = funded_pool(1_000);
        pool.add_recipient(TierId(1), 2, ts(0)).unwrap();
        pool.set_rate(1, ts(0)).unwrap();
        for secs in 1..=3 {
            pool.update(ts(secs)).unwrap();
        }
        // Three units over weight 3 is exactly one unit per weight.
        assert_eq!(pool.acc_per_weight(), ACC_PRECISION);
    }

    #[test]
    fn refund_undoes_the_emission() {
        let mut pool = funded_pool(1_000);
        pool.set_rate(10, ts(0)).unwrap();
        pool.update(ts(30)).unwrap();
        pool.refund(100).unwrap();
        assert_eq!(pool.reserve, 800);
        assert_eq!(pool.total_emitted, 200);
        assert_eq!(pool.reserve + pool.total_emitted, 1_000);
        assert_eq!(pool.refund(201), Err(RewardError::Overflow));
    }

    #[test]
    fn backwards_time_is_rejected() {
        let mut pool = funded_pool(0);
        pool.update(ts(10)).unwrap();
        assert!(matches!(pool.update(ts(5)), Err(RewardError::InvalidTimeOrder { .. })));
    }
}
